use sea_orm::{EntityName, Schema};
use sea_orm_migration::prelude::*;

use crate::infra::storage::entity::{app, app_version};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        manager
            .create_table(schema.create_table_from_entity(app::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(app_version::Entity))
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_apps_tenant_id")
                    .table(app::Entity.table_ref())
                    .col(app::Column::Tenant)
                    .col(app::Column::Id)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("ux_apps_versions_app_version")
                    .table(app_version::Entity.table_ref())
                    .col(app_version::Column::AppSeqId)
                    .col(app_version::Column::Version)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("ix_apps_owner")
                    .table(app::Entity.table_ref())
                    .col(app::Column::Tenant)
                    .col(app::Column::Owner)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(app_version::Entity.table_ref()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(app::Entity.table_ref()).to_owned())
            .await
    }
}
