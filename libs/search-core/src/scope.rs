//! Authorization scope: which resource ids a caller may see for a list type.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::literal::Literal;
use crate::predicate::Predicate;
use crate::schema::KeyColumns;

/// Who is asking. The tenant bounds every query; the user drives ownership.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchCtx {
    pub tenant: String,
    pub user: String,
}

impl SearchCtx {
    pub fn new(tenant: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            user: user.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListType {
    #[default]
    Owned,
    SharedPublic,
    SharedDirect,
    Mine,
    ReadPerm,
    All,
}

impl ListType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owned => "OWNED",
            Self::SharedPublic => "SHARED_PUBLIC",
            Self::SharedDirect => "SHARED_DIRECT",
            Self::Mine => "MINE",
            Self::ReadPerm => "READ_PERM",
            Self::All => "ALL",
        }
    }
}

impl fmt::Display for ListType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        [
            Self::Owned,
            Self::SharedPublic,
            Self::SharedDirect,
            Self::Mine,
            Self::ReadPerm,
            Self::All,
        ]
        .into_iter()
        .find(|lt| lt.as_str() == normalized)
        .ok_or_else(|| format!("unknown list type '{s}'"))
    }
}

/// Result of composing the authorization scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthScope {
    /// The caller can see nothing; the store must not be queried.
    Empty,
    Filter(Predicate),
}

/// Build the inclusion predicate for `list_type` from pre-fetched id sets.
pub fn compose_scope(
    keys: &KeyColumns,
    ctx: &SearchCtx,
    list_type: ListType,
    shared_ids: &BTreeSet<String>,
    viewable_ids: &BTreeSet<String>,
) -> AuthScope {
    let owned = || Predicate::equals(keys.owner, Literal::String(ctx.user.clone()));
    let ids = |set: &BTreeSet<String>| Predicate::in_strings(keys.id, set.iter().cloned());

    match list_type {
        ListType::Owned => AuthScope::Filter(owned()),
        ListType::SharedPublic | ListType::SharedDirect if shared_ids.is_empty() => AuthScope::Empty,
        ListType::SharedPublic | ListType::SharedDirect => AuthScope::Filter(ids(shared_ids)),
        ListType::Mine => AuthScope::Filter(owned().or(ids(shared_ids))),
        ListType::ReadPerm if viewable_ids.is_empty() => AuthScope::Empty,
        ListType::ReadPerm => AuthScope::Filter(ids(viewable_ids)),
        ListType::All => {
            let union: BTreeSet<String> = shared_ids.union(viewable_ids).cloned().collect();
            AuthScope::Filter(owned().or(ids(&union)))
        }
    }
}
