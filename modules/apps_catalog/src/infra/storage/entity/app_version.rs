use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// One immutable version of an app.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "apps_versions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub seq_id: i32,
    pub app_seq_id: i32,
    pub tenant: String,
    pub app_id: String,
    pub version: String,
    pub description: Option<String>,
    pub runtime: String,
    pub runtime_version: Option<String>,
    pub job_type: String,
    pub max_jobs: i64,
    pub max_jobs_per_user: i64,
    pub strict_file_inputs: bool,
    /// Unit-separator encoded, see `search_core::literal::encode_string_array`.
    pub tags: String,
    pub uuid: Uuid,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::app::Entity",
        from = "Column::AppSeqId",
        to = "super::app::Column::SeqId",
        on_delete = "Cascade"
    )]
    App,
}

impl Related<super::app::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::App.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
