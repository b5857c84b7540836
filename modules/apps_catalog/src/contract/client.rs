use async_trait::async_trait;
use search_core::{Page, QuerySpec, SearchCtx};
use std::collections::BTreeSet;

use crate::contract::error::AppsCatalogError;
use crate::contract::model::{App, NewApp, NewAppVersion};

/// Public API of the apps catalog for in-process consumers.
#[async_trait]
pub trait AppsCatalogApi: Send + Sync {
    /// Search with a compiled, authorization-scoped query.
    async fn search_apps(
        &self,
        ctx: &SearchCtx,
        spec: &QuerySpec,
    ) -> Result<Page<App>, AppsCatalogError>;

    /// One app by id; the latest version unless `version` is given.
    /// `shared_ids` widens visibility beyond the caller's own apps.
    async fn get_app(
        &self,
        ctx: &SearchCtx,
        id: &str,
        version: Option<&str>,
        shared_ids: &BTreeSet<String>,
    ) -> Result<App, AppsCatalogError>;

    async fn create_app(&self, ctx: &SearchCtx, new_app: NewApp) -> Result<App, AppsCatalogError>;

    async fn add_version(
        &self,
        ctx: &SearchCtx,
        id: &str,
        new_version: NewAppVersion,
    ) -> Result<App, AppsCatalogError>;
}
