use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Effective row cap; `None` when unbounded.
    pub limit: Option<u64>,
    pub skip: u64,
    /// Only filled when the caller asked for it.
    pub total_count: Option<u64>,
    /// Major sort value of the last row of a full, ordered page.
    pub next_start_after: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_info: PageInfo,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page_info: PageInfo) -> Self {
        Self { items, page_info }
    }

    /// Create an empty page for the given window
    pub fn empty(limit: Option<u64>, skip: u64) -> Self {
        Self {
            items: Vec::new(),
            page_info: PageInfo {
                limit,
                skip,
                ..PageInfo::default()
            },
        }
    }

    /// True when the page holds as many rows as the window allows.
    pub fn is_full(&self) -> bool {
        self.page_info
            .limit
            .is_some_and(|limit| limit > 0 && self.items.len() as u64 == limit)
    }
}
