use serde::{Deserialize, Serialize};

/// `modules.apps_catalog` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppsCatalogConfig {
    /// Row cap used when a search gives no limit.
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    /// Upper bound for any positive limit.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
}

impl Default for AppsCatalogConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_page_size() -> u64 {
    50
}

fn default_max_page_size() -> u64 {
    1000
}
