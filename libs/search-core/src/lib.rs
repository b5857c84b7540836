//! Search-predicate compiler for the apps catalog.
//!
//! Turns a client [`QuerySpec`] (flat `attribute.operator.value` conditions
//! or a [`ConditionTree`]) plus a caller and an authorization list type into
//! a backend-neutral [`SearchPlan`]. No I/O happens here; storage layers
//! lower the plan's [`Predicate`] into their own query builder.

pub mod ast;
pub mod condition;
pub mod error;
pub mod literal;
pub mod op;
pub mod order;
pub mod page;
pub mod plan;
pub mod predicate;
pub mod query;
pub mod schema;
pub mod scope;
pub mod tree;
pub mod version;

pub use ast::ConditionTree;
pub use condition::{parse_condition, Condition, Operand};
pub use error::{LiteralError, SearchError, SearchResult};
pub use literal::Literal;
pub use op::{CompareOperator, SearchOp};
pub use order::{OrderBy, OrderKey, SortDir};
pub use page::{Page, PageInfo};
pub use plan::{compile_search, CompiledSearch, LimitCfg, SearchPlan, SortKey, Window};
pub use predicate::Predicate;
pub use query::{QuerySpec, SearchConditions};
pub use schema::{ColumnDef, ColumnGroup, ColumnKind, ColumnRef, KeyColumns, SchemaTable};
pub use scope::{compose_scope, AuthScope, ListType, SearchCtx};
pub use tree::compile_tree;
pub use version::{references_version, resolve_version_scope, VersionScope};

#[cfg(test)]
mod tests;
