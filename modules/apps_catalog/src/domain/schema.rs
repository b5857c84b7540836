//! Searchable attributes of the catalog.

use search_core::{ColumnKind, ColumnRef, KeyColumns, SchemaTable};
use std::sync::LazyLock;

use crate::contract::model::{JobType, Runtime};

pub const APPS_TABLE: &str = "apps";
pub const VERSIONS_TABLE: &str = "apps_versions";

/// Attribute → column registry shared by every search.
pub static APPS_SCHEMA: LazyLock<SchemaTable> = LazyLock::new(|| {
    let keys = KeyColumns {
        tenant: ColumnRef::new(APPS_TABLE, "tenant"),
        id: ColumnRef::new(APPS_TABLE, "id"),
        owner: ColumnRef::new(APPS_TABLE, "owner"),
        deleted: ColumnRef::new(APPS_TABLE, "deleted"),
        latest_version: ColumnRef::new(APPS_TABLE, "latest_version"),
        version: ColumnRef::new(VERSIONS_TABLE, "version"),
        tiebreakers: vec![
            ColumnRef::new(APPS_TABLE, "seq_id"),
            ColumnRef::new(VERSIONS_TABLE, "seq_id"),
        ],
    };

    SchemaTable::new(APPS_TABLE, VERSIONS_TABLE, keys)
        .identity("id", ColumnKind::String)
        .identity("owner", ColumnKind::String)
        .identity("enabled", ColumnKind::Boolean)
        .identity("deleted", ColumnKind::Boolean)
        .identity("latest_version", ColumnKind::String)
        .version("version", ColumnKind::String)
        .optional_version("description", ColumnKind::String)
        .version("runtime", ColumnKind::Enum(Runtime::ALL))
        .optional_version("runtime_version", ColumnKind::String)
        .version("job_type", ColumnKind::Enum(JobType::ALL))
        .version("max_jobs", ColumnKind::Integer)
        .version("max_jobs_per_user", ColumnKind::Integer)
        .version("strict_file_inputs", ColumnKind::Boolean)
        .version("tags", ColumnKind::StringArray)
        .version("uuid", ColumnKind::Uuid)
        .version("created", ColumnKind::Timestamp)
        .version("updated", ColumnKind::Timestamp)
});
