//! Reduce a [`ConditionTree`] to a [`Predicate`].

use crate::ast::ConditionTree;
use crate::condition::parse_condition;
use crate::error::{SearchError, SearchResult};
use crate::op::SearchOp;
use crate::predicate::Predicate;
use crate::schema::SchemaTable;

enum Logical {
    And,
    Or,
}

fn logical(op: &str) -> Option<Logical> {
    let op = op.trim();
    if op.eq_ignore_ascii_case("and") {
        Some(Logical::And)
    } else if op.eq_ignore_ascii_case("or") {
        Some(Logical::Or)
    } else {
        None
    }
}

fn ensure_no_unary_op(op: Option<&str>) -> SearchResult<()> {
    match op.map(str::trim) {
        None | Some("") => Ok(()),
        Some(op) => Err(SearchError::malformed_tree(format!(
            "unsupported unary operator '{op}'"
        ))),
    }
}

/// Text of a leaf, looking through operator-less unary wrappers.
fn leaf_text(node: &ConditionTree) -> SearchResult<&str> {
    match node {
        ConditionTree::Leaf(value) => Ok(value),
        ConditionTree::Unary { op, child } => {
            ensure_no_unary_op(op.as_deref())?;
            leaf_text(child)
        }
        ConditionTree::Binary { op, .. } => Err(SearchError::malformed_tree(format!(
            "operand of a comparison must be a leaf, found '{op}' node"
        ))),
    }
}

/// Compile a tree into a predicate. Comparison nodes are re-serialized to
/// `attribute.op.value` and go through [`parse_condition`], so trees and
/// flat lists share one validation path.
pub fn compile_tree(schema: &SchemaTable, tree: &ConditionTree) -> SearchResult<Predicate> {
    match tree {
        ConditionTree::Leaf(value) => Err(SearchError::malformed_tree(format!(
            "bare leaf '{value}' is not a condition"
        ))),
        ConditionTree::Unary { op, child } => {
            ensure_no_unary_op(op.as_deref())?;
            compile_tree(schema, child)
        }
        ConditionTree::Binary { op, left, right } => match logical(op) {
            Some(Logical::And) => Ok(compile_tree(schema, left)?.and(compile_tree(schema, right)?)),
            Some(Logical::Or) => Ok(compile_tree(schema, left)?.or(compile_tree(schema, right)?)),
            None => {
                let op = SearchOp::parse(op.trim())?;
                let attribute = leaf_text(left)?;
                let value = leaf_text(right)?;
                let raw = format!("{}.{}.{}", attribute.trim(), op.as_str(), value);
                Ok(parse_condition(schema, &raw)?.into_predicate())
            }
        },
    }
}

/// Attribute text of every comparison node in the tree.
pub(crate) fn comparison_attributes(tree: &ConditionTree) -> Vec<&str> {
    fn walk<'t>(node: &'t ConditionTree, out: &mut Vec<&'t str>) {
        match node {
            ConditionTree::Leaf(_) => {}
            ConditionTree::Unary { child, .. } => walk(child, out),
            ConditionTree::Binary { op, left, right } => {
                if logical(op).is_some() {
                    walk(left, out);
                    walk(right, out);
                } else if let Ok(attribute) = leaf_text(left) {
                    out.push(attribute.trim());
                }
            }
        }
    }
    let mut out = Vec::new();
    walk(tree, &mut out);
    out
}
