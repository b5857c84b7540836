use serde::{Deserialize, Serialize};

/// Boolean search expression as produced by an external parser.
///
/// Leaves carry raw text (an attribute name or a value); comparison nodes
/// join their two leaves back into `attribute.op.value` form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionTree {
    Leaf(String),
    Unary {
        #[serde(default)]
        op: Option<String>,
        child: Box<ConditionTree>,
    },
    Binary {
        op: String,
        left: Box<ConditionTree>,
        right: Box<ConditionTree>,
    },
}

impl ConditionTree {
    pub fn leaf(value: impl Into<String>) -> Self {
        Self::Leaf(value.into())
    }

    /// Operator-less unary wrapper, e.g. a parenthesized group.
    pub fn group(child: ConditionTree) -> Self {
        Self::Unary {
            op: None,
            child: Box::new(child),
        }
    }

    pub fn binary(op: impl Into<String>, left: ConditionTree, right: ConditionTree) -> Self {
        Self::Binary {
            op: op.into(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// `attribute op value` comparison node.
    pub fn compare(attribute: &str, op: &str, value: &str) -> Self {
        Self::binary(op, Self::leaf(attribute), Self::leaf(value))
    }

    pub fn and(left: ConditionTree, right: ConditionTree) -> Self {
        Self::binary("AND", left, right)
    }

    pub fn or(left: ConditionTree, right: ConditionTree) -> Self {
        Self::binary("OR", left, right)
    }
}
