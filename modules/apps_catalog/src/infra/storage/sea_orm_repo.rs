//! SeaORM-backed repository implementation for the domain port.
//!
//! Generic over the connection, so it runs on a `DatabaseConnection` or on
//! anything else that can open transactions. Searches always read the fixed
//! `apps_versions INNER JOIN apps` pair; the compiled plan supplies filter,
//! order and window.

use anyhow::Context;
use modkit_db::search::SearchSelectExt;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QuerySelect, RelationTrait, Select, Set, TransactionTrait,
};
use search_core::literal::encode_string_array;
use search_core::SearchPlan;

use crate::contract::model::App;
use crate::domain::repo::AppsRepository;
use crate::infra::storage::entity::{app, app_version};
use crate::infra::storage::mapper::rows_to_contract;

pub struct SeaOrmAppsRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmAppsRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

/// The version join every search runs against.
fn joined() -> Select<app_version::Entity> {
    app_version::Entity::find().join(JoinType::InnerJoin, app_version::Relation::App.def())
}

fn version_row(app: &App, app_seq_id: i32) -> app_version::ActiveModel {
    app_version::ActiveModel {
        app_seq_id: Set(app_seq_id),
        tenant: Set(app.tenant.clone()),
        app_id: Set(app.id.clone()),
        version: Set(app.version.clone()),
        description: Set(app.description.clone()),
        runtime: Set(app.runtime.to_string()),
        runtime_version: Set(app.runtime_version.clone()),
        job_type: Set(app.job_type.to_string()),
        max_jobs: Set(app.max_jobs),
        max_jobs_per_user: Set(app.max_jobs_per_user),
        strict_file_inputs: Set(app.strict_file_inputs),
        tags: Set(encode_string_array(&app.tags)),
        uuid: Set(app.uuid),
        created: Set(app.created),
        updated: Set(app.updated),
        ..Default::default()
    }
}

#[async_trait::async_trait]
impl<C> AppsRepository for SeaOrmAppsRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn search_page(&self, plan: &SearchPlan) -> anyhow::Result<Vec<App>> {
        let rows = joined()
            .apply_search_plan(plan)
            .select_also(app::Entity)
            .all(&self.conn)
            .await
            .context("search_page failed")?;

        rows.into_iter()
            .map(|(version, identity)| {
                let identity = identity.context("version row without identity row")?;
                rows_to_contract(version, identity)
            })
            .collect()
    }

    async fn count_matching(&self, plan: &SearchPlan) -> anyhow::Result<u64> {
        joined()
            .apply_search_filter(plan.filter())
            .count(&self.conn)
            .await
            .context("count_matching failed")
    }

    async fn app_exists(&self, tenant: &str, id: &str) -> anyhow::Result<bool> {
        let count = app::Entity::find()
            .filter(app::Column::Tenant.eq(tenant))
            .filter(app::Column::Id.eq(id))
            .count(&self.conn)
            .await
            .context("app_exists failed")?;
        Ok(count > 0)
    }

    async fn version_exists(&self, tenant: &str, id: &str, version: &str) -> anyhow::Result<bool> {
        let count = app_version::Entity::find()
            .filter(app_version::Column::Tenant.eq(tenant))
            .filter(app_version::Column::AppId.eq(id))
            .filter(app_version::Column::Version.eq(version))
            .count(&self.conn)
            .await
            .context("version_exists failed")?;
        Ok(count > 0)
    }

    async fn insert_app(&self, a: App) -> anyhow::Result<()> {
        let txn = self.conn.begin().await.context("begin failed")?;

        let identity = app::ActiveModel {
            tenant: Set(a.tenant.clone()),
            id: Set(a.id.clone()),
            latest_version: Set(a.version.clone()),
            owner: Set(a.owner.clone()),
            enabled: Set(a.enabled),
            deleted: Set(false),
            created: Set(a.created),
            updated: Set(a.updated),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("insert app failed")?;

        version_row(&a, identity.seq_id)
            .insert(&txn)
            .await
            .context("insert app version failed")?;

        txn.commit().await.context("commit failed")?;
        Ok(())
    }

    async fn insert_version(&self, a: App) -> anyhow::Result<bool> {
        let txn = self.conn.begin().await.context("begin failed")?;

        let Some(identity) = app::Entity::find()
            .filter(app::Column::Tenant.eq(a.tenant.as_str()))
            .filter(app::Column::Id.eq(a.id.as_str()))
            .filter(app::Column::Deleted.eq(false))
            .one(&txn)
            .await
            .context("load app failed")?
        else {
            txn.rollback().await.context("rollback failed")?;
            return Ok(false);
        };

        version_row(&a, identity.seq_id)
            .insert(&txn)
            .await
            .context("insert app version failed")?;

        app::Entity::update_many()
            .col_expr(app::Column::LatestVersion, Expr::value(a.version.clone()))
            .col_expr(app::Column::Updated, Expr::value(a.updated))
            .filter(app::Column::SeqId.eq(identity.seq_id))
            .exec(&txn)
            .await
            .context("move latest pointer failed")?;

        txn.commit().await.context("commit failed")?;
        Ok(true)
    }
}
