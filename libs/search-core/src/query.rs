use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ast::ConditionTree;
use crate::order::OrderBy;
use crate::scope::ListType;

/// Search conditions in either of the two accepted shapes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchConditions {
    /// Flat `attribute.operator.value` strings, implicitly ANDed.
    List(Vec<String>),
    Tree(ConditionTree),
}

impl Default for SearchConditions {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

/// One search request. Built per call, never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuerySpec {
    pub conditions: SearchConditions,
    pub order_by: OrderBy,
    /// `None` uses the configured default; negative means unbounded.
    pub limit: Option<i64>,
    /// Negative values are treated as 0.
    pub skip: Option<i64>,
    pub start_after: Option<String>,
    /// Overrides detection of a `version` condition when set.
    pub version_specified: Option<bool>,
    pub list_type: ListType,
    pub viewable_ids: BTreeSet<String>,
    pub shared_ids: BTreeSet<String>,
    pub include_deleted: bool,
    pub compute_total: bool,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conditions<I, S>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions = SearchConditions::List(conditions.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_tree(mut self, tree: ConditionTree) -> Self {
        self.conditions = SearchConditions::Tree(tree);
        self
    }

    pub fn with_order(mut self, order: OrderBy) -> Self {
        self.order_by = order;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn with_start_after(mut self, value: impl Into<String>) -> Self {
        self.start_after = Some(value.into());
        self
    }

    pub fn with_version_specified(mut self, specified: bool) -> Self {
        self.version_specified = Some(specified);
        self
    }

    pub fn with_list_type(mut self, list_type: ListType) -> Self {
        self.list_type = list_type;
        self
    }

    pub fn with_shared_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shared_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_viewable_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.viewable_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn include_deleted(mut self, include: bool) -> Self {
        self.include_deleted = include;
        self
    }

    pub fn compute_total(mut self, compute: bool) -> Self {
        self.compute_total = compute;
        self
    }
}
