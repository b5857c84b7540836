use std::sync::Arc;

use anyhow::Context;
use modkit_db::DbHandle;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::config::AppsCatalogConfig;
use crate::contract::client::AppsCatalogApi;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::AppsCatalogLocalClient;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::sea_orm_repo::SeaOrmAppsRepository;

/// Wires the catalog onto a database handle.
pub struct AppsCatalog {
    service: Arc<Service>,
}

impl AppsCatalog {
    /// Apply pending migrations and build the service.
    pub async fn init(db: &DbHandle, config: &AppsCatalogConfig) -> anyhow::Result<Self> {
        let conn = db.sea();
        Migrator::up(&conn, None)
            .await
            .context("apps_catalog migrations failed")?;
        info!(
            default_page_size = config.default_page_size,
            max_page_size = config.max_page_size,
            "apps_catalog initialized"
        );

        let repo = SeaOrmAppsRepository::new(conn);
        let service = Service::new(Arc::new(repo), ServiceConfig::from(config));
        Ok(Self {
            service: Arc::new(service),
        })
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    pub fn client(&self) -> Arc<dyn AppsCatalogApi> {
        Arc::new(AppsCatalogLocalClient::new(self.service.clone()))
    }
}
