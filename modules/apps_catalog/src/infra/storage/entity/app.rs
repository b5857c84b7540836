use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// Identity row: one per `(tenant, id)`, pointing at the latest version.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "apps")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub seq_id: i32,
    pub tenant: String,
    pub id: String,
    pub latest_version: String,
    pub owner: String,
    pub enabled: bool,
    pub deleted: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::app_version::Entity")]
    Versions,
}

impl Related<super::app_version::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Versions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
