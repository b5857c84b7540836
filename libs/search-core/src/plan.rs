//! Whole-request compilation: one filter, one ordering, one window.
//!
//! Count and fetch are both derived from the single [`SearchPlan::filter`],
//! so they cannot disagree about which rows match.

use tracing::debug;

use crate::condition::{build_condition, parse_condition};
use crate::error::{SearchError, SearchResult};
use crate::literal::{escape_value, Literal};
use crate::op::SearchOp;
use crate::order::SortDir;
use crate::predicate::Predicate;
use crate::query::{QuerySpec, SearchConditions};
use crate::schema::{ColumnDef, ColumnRef, SchemaTable};
use crate::scope::{compose_scope, AuthScope, SearchCtx};
use crate::tree::compile_tree;
use crate::version::{resolve_version_scope, VersionScope};

/// Page size policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LimitCfg {
    pub default: u64,
    pub max: u64,
}

impl Default for LimitCfg {
    fn default() -> Self {
        Self {
            default: 50,
            max: 1000,
        }
    }
}

impl LimitCfg {
    /// Absent → default (itself capped), negative → unbounded, otherwise
    /// capped at `max`.
    pub fn clamp(&self, requested: Option<i64>) -> Option<u64> {
        match requested {
            None => Some(self.default.min(self.max)),
            Some(n) if n < 0 => None,
            Some(n) => Some((n as u64).min(self.max)),
        }
    }
}

/// Offset then row cap. `limit: None` means no cap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Window {
    pub skip: u64,
    pub limit: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub column: ColumnRef,
    pub dir: SortDir,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchPlan {
    filter: Predicate,
    order: Vec<SortKey>,
    window: Window,
    version_scope: VersionScope,
    major: Option<ColumnDef>,
}

impl SearchPlan {
    /// The one predicate shared by count and fetch.
    pub fn filter(&self) -> &Predicate {
        &self.filter
    }

    /// Client keys followed by the schema's tiebreakers.
    pub fn order(&self) -> &[SortKey] {
        &self.order
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn version_scope(&self) -> VersionScope {
        self.version_scope
    }

    /// Attribute of the first client sort key, if any.
    pub fn major(&self) -> Option<&ColumnDef> {
        self.major.as_ref()
    }

    /// The major key when a value taken from it can continue the listing
    /// as `startAfter`.
    pub fn keyset_major(&self) -> Option<&ColumnDef> {
        self.major.as_ref().filter(|def| def.supports_keyset())
    }

    /// Same plan, one more row. The extra row shows whether the last row of
    /// the page ties with what follows. Unbounded plans are unchanged.
    pub fn with_lookahead(&self) -> Self {
        let mut plan = self.clone();
        plan.window.limit = self.window.limit.map(|n| n.saturating_add(1));
        plan
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompiledSearch {
    /// Authorization leaves nothing visible; skip the store entirely.
    Empty { window: Window },
    Plan(SearchPlan),
}

impl CompiledSearch {
    pub fn window(&self) -> Window {
        match self {
            Self::Empty { window } => *window,
            Self::Plan(plan) => plan.window,
        }
    }
}

fn search_predicate(schema: &SchemaTable, conditions: &SearchConditions) -> SearchResult<Predicate> {
    match conditions {
        SearchConditions::List(items) => items
            .iter()
            .map(|raw| parse_condition(schema, raw).map(|c| c.into_predicate()))
            .collect::<SearchResult<Vec<_>>>()
            .map(Predicate::all),
        SearchConditions::Tree(tree) => compile_tree(schema, tree),
    }
}

fn sort_keys(schema: &SchemaTable, spec: &QuerySpec) -> SearchResult<Vec<(ColumnDef, SortDir)>> {
    spec.order_by
        .0
        .iter()
        .map(|key| {
            schema
                .resolve(&key.field)
                .map(|def| (*def, key.dir))
                .ok_or_else(|| SearchError::UnknownSortAttribute(key.field.clone()))
        })
        .collect()
}

/// Keyset bound `major > value` (asc) or `major < value` (desc), validated
/// like any other condition on that column.
fn start_after_predicate(
    start_after: Option<&str>,
    major: Option<(ColumnDef, SortDir)>,
) -> SearchResult<Predicate> {
    let Some(value) = start_after else {
        return Ok(Predicate::Always);
    };
    let (def, dir) = major.ok_or(SearchError::StartAfterRequiresOrderBy)?;
    let op = match dir {
        SortDir::Asc => SearchOp::Gt,
        SortDir::Desc => SearchOp::Lt,
    };
    Ok(build_condition(def, op, &escape_value(value))?.into_predicate())
}

/// Compile a whole request. Every part of `spec` is validated before the
/// authorization short-circuit is considered, so a bad request fails the
/// same way whether or not the caller can see anything.
pub fn compile_search(
    spec: &QuerySpec,
    ctx: &SearchCtx,
    schema: &SchemaTable,
    limits: LimitCfg,
) -> SearchResult<CompiledSearch> {
    let keys = schema.keys();

    let search = search_predicate(schema, &spec.conditions)?;
    let sort = sort_keys(schema, spec)?;
    let bound = start_after_predicate(spec.start_after.as_deref(), sort.first().copied())?;
    let version_scope = resolve_version_scope(schema, &spec.conditions, spec.version_specified);

    let window = Window {
        skip: spec.skip.map_or(0, |s| s.max(0) as u64),
        limit: limits.clamp(spec.limit),
    };

    let scope = match compose_scope(
        keys,
        ctx,
        spec.list_type,
        &spec.shared_ids,
        &spec.viewable_ids,
    ) {
        AuthScope::Empty => {
            debug!(list_type = %spec.list_type, "authorization scope is empty, skipping store");
            return Ok(CompiledSearch::Empty { window });
        }
        AuthScope::Filter(p) => p,
    };

    let mut base = Predicate::equals(keys.tenant, Literal::String(ctx.tenant.clone()));
    if !spec.include_deleted {
        base = base.and(Predicate::equals(keys.deleted, Literal::Bool(false)));
    }

    let filter = Predicate::all([base, scope, version_scope.predicate(schema), search, bound]);

    let order = sort
        .iter()
        .map(|(def, dir)| SortKey {
            column: def.column,
            dir: *dir,
        })
        .chain(keys.tiebreakers.iter().map(|column| SortKey {
            column: *column,
            dir: SortDir::Asc,
        }))
        .collect();

    debug!(
        ?version_scope,
        skip = window.skip,
        limit = ?window.limit,
        %filter,
        "search compiled"
    );

    Ok(CompiledSearch::Plan(SearchPlan {
        filter,
        order,
        window,
        version_scope,
        major: sort.first().map(|(def, _)| *def),
    }))
}
