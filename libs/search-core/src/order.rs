use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SearchError, SearchResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn parse(s: &str) -> SearchResult<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(SearchError::InvalidSortDirection(s.to_string()))
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderKey {
    pub field: String,
    #[serde(default)]
    pub dir: SortDir,
}

impl OrderKey {
    pub fn new(field: impl Into<String>, dir: SortDir) -> Self {
        Self {
            field: field.into(),
            dir,
        }
    }
}

/// Client ordering, major key first. Attribute names are validated when the
/// search is compiled, not here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderBy(pub Vec<OrderKey>);

impl OrderBy {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn major(&self) -> Option<&OrderKey> {
        self.0.first()
    }

    /// Parse `attr(asc|desc)[,attr(dir)...]`; a key without parentheses
    /// sorts ascending. Blank input yields an empty ordering.
    pub fn parse(raw: &str) -> SearchResult<Self> {
        let mut keys = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let key = match part.split_once('(') {
                None => OrderKey::new(part, SortDir::Asc),
                Some((field, rest)) => {
                    let dir = rest
                        .strip_suffix(')')
                        .ok_or_else(|| SearchError::InvalidSortDirection(rest.to_string()))?;
                    OrderKey::new(field.trim(), SortDir::parse(dir)?)
                }
            };
            if key.field.is_empty() {
                return Err(SearchError::UnknownSortAttribute(part.to_string()));
            }
            keys.push(key);
        }
        Ok(Self(keys))
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}({})", key.field, key.dir.as_str())?;
        }
        Ok(())
    }
}
