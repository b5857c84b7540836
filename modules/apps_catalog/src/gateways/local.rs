use async_trait::async_trait;
use search_core::{Page, QuerySpec, SearchCtx};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::contract::{
    client::AppsCatalogApi,
    error::AppsCatalogError,
    model::{App, NewApp, NewAppVersion},
};
use crate::domain::service::Service;

/// In-process client that delegates to the domain service.
pub struct AppsCatalogLocalClient {
    service: Arc<Service>,
}

impl AppsCatalogLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AppsCatalogApi for AppsCatalogLocalClient {
    async fn search_apps(
        &self,
        ctx: &SearchCtx,
        spec: &QuerySpec,
    ) -> Result<Page<App>, AppsCatalogError> {
        self.service.search_apps(ctx, spec).await.map_err(Into::into)
    }

    async fn get_app(
        &self,
        ctx: &SearchCtx,
        id: &str,
        version: Option<&str>,
        shared_ids: &BTreeSet<String>,
    ) -> Result<App, AppsCatalogError> {
        self.service
            .get_app(ctx, id, version, shared_ids)
            .await
            .map_err(Into::into)
    }

    async fn create_app(&self, ctx: &SearchCtx, new_app: NewApp) -> Result<App, AppsCatalogError> {
        self.service.create_app(ctx, new_app).await.map_err(Into::into)
    }

    async fn add_version(
        &self,
        ctx: &SearchCtx,
        id: &str,
        new_version: NewAppVersion,
    ) -> Result<App, AppsCatalogError> {
        self.service
            .add_version(ctx, id, new_version)
            .await
            .map_err(Into::into)
    }
}
