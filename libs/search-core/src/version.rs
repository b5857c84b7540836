//! Latest-version vs all-versions decision.

use crate::condition::condition_attribute;
use crate::predicate::Predicate;
use crate::query::SearchConditions;
use crate::schema::SchemaTable;
use crate::tree::comparison_attributes;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VersionScope {
    /// Only the row each resource's latest-version pointer references.
    LatestOnly,
    /// Every version row that matches.
    AllVersions,
}

impl VersionScope {
    pub fn from_specified(version_specified: bool) -> Self {
        if version_specified {
            Self::AllVersions
        } else {
            Self::LatestOnly
        }
    }

    /// Join restriction this scope adds to the filter.
    pub fn predicate(self, schema: &SchemaTable) -> Predicate {
        match self {
            Self::LatestOnly => {
                let keys = schema.keys();
                Predicate::ColumnsEqual(keys.latest_version, keys.version)
            }
            Self::AllVersions => Predicate::Always,
        }
    }
}

/// True when any condition constrains the version attribute. Attributes are
/// resolved through the schema (camelCase included); value text is never
/// inspected.
pub fn references_version(schema: &SchemaTable, conditions: &SearchConditions) -> bool {
    let is_version = |name: &str| {
        schema
            .resolve(name)
            .is_some_and(|def| schema.is_version_attribute(def))
    };
    match conditions {
        SearchConditions::List(items) => items.iter().any(|raw| {
            condition_attribute(schema, raw).is_some_and(|def| schema.is_version_attribute(def))
        }),
        SearchConditions::Tree(tree) => comparison_attributes(tree).into_iter().any(is_version),
    }
}

/// An explicit caller flag wins over scanning the conditions.
pub fn resolve_version_scope(
    schema: &SchemaTable,
    conditions: &SearchConditions,
    version_specified: Option<bool>,
) -> VersionScope {
    let specified = version_specified.unwrap_or_else(|| references_version(schema, conditions));
    VersionScope::from_specified(specified)
}
