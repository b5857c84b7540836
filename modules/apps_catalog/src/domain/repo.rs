use async_trait::async_trait;
use search_core::SearchPlan;

use crate::contract::model::App;

/// Port for the domain layer: the persistence operations the catalog needs.
///
/// `search_page` and `count_matching` receive the same compiled plan, so a
/// count always describes exactly the rows a fetch would return.
#[async_trait]
pub trait AppsRepository: Send + Sync {
    /// Rows matching `plan.filter()`, ordered and windowed by the plan.
    async fn search_page(&self, plan: &SearchPlan) -> anyhow::Result<Vec<App>>;

    /// Number of rows matching `plan.filter()`, ignoring order and window.
    async fn count_matching(&self, plan: &SearchPlan) -> anyhow::Result<u64>;

    /// True when `(tenant, id)` has an identity row, deleted or not.
    async fn app_exists(&self, tenant: &str, id: &str) -> anyhow::Result<bool>;

    async fn version_exists(&self, tenant: &str, id: &str, version: &str) -> anyhow::Result<bool>;

    /// Insert the identity row and its first version atomically.
    ///
    /// Service computes uuid/timestamps/validation; repo persists.
    async fn insert_app(&self, app: App) -> anyhow::Result<()>;

    /// Insert a version and move the latest pointer to it atomically.
    /// Returns false when no live identity row exists for `(tenant, id)`.
    async fn insert_version(&self, app: App) -> anyhow::Result<bool>;
}
