use thiserror::Error;

use crate::op::SearchOp;
use crate::schema::ColumnKind;

/// Why a literal was rejected for its column.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LiteralError {
    #[error("not a valid timestamp")]
    Timestamp,

    #[error("expected {expected} values, got {got}")]
    Arity { expected: usize, got: usize },

    #[error("not a valid integer")]
    Integer,

    #[error("expected true or false")]
    Boolean,

    #[error("not a valid uuid")]
    Uuid,

    #[error("expected one of: {allowed}")]
    Enum { allowed: String },
}

/// Client-input errors raised while compiling a search.
///
/// None of these are retryable and none of them are raised after a
/// statement has been issued to the store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("malformed search condition: {0}")]
    MalformedCondition(String),

    #[error("unknown search attribute: {0}")]
    UnknownAttribute(String),

    #[error("unsupported search operator: {0}")]
    UnsupportedOperator(String),

    #[error("operator {op} is not allowed for attribute {attribute} of type {kind}")]
    OperatorNotAllowedForType {
        attribute: String,
        op: SearchOp,
        kind: ColumnKind,
    },

    #[error("invalid value '{value}' for attribute {attribute}: {reason}")]
    InvalidLiteral {
        attribute: String,
        value: String,
        reason: LiteralError,
    },

    #[error("malformed condition tree: {0}")]
    MalformedTree(String),

    #[error("unknown sort attribute: {0}")]
    UnknownSortAttribute(String),

    #[error("invalid sort direction: {0}")]
    InvalidSortDirection(String),

    #[error("startAfter requires orderBy")]
    StartAfterRequiresOrderBy,
}

impl SearchError {
    pub(crate) fn invalid_literal(
        attribute: &str,
        value: impl Into<String>,
        reason: LiteralError,
    ) -> Self {
        Self::InvalidLiteral {
            attribute: attribute.to_string(),
            value: value.into(),
            reason,
        }
    }

    pub(crate) fn malformed_tree(msg: impl Into<String>) -> Self {
        Self::MalformedTree(msg.into())
    }

    /// True for a timestamp literal that could not be parsed.
    pub fn is_invalid_timestamp(&self) -> bool {
        matches!(
            self,
            Self::InvalidLiteral {
                reason: LiteralError::Timestamp,
                ..
            }
        )
    }

    /// Stable machine-readable code, used when mapping into module errors.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedCondition(_) => "MALFORMED_CONDITION",
            Self::UnknownAttribute(_) => "UNKNOWN_ATTRIBUTE",
            Self::UnsupportedOperator(_) => "UNSUPPORTED_OPERATOR",
            Self::OperatorNotAllowedForType { .. } => "OPERATOR_NOT_ALLOWED_FOR_TYPE",
            Self::InvalidLiteral {
                reason: LiteralError::Timestamp,
                ..
            } => "INVALID_TIMESTAMP_LITERAL",
            Self::InvalidLiteral { .. } => "INVALID_LITERAL",
            Self::MalformedTree(_) => "MALFORMED_TREE",
            Self::UnknownSortAttribute(_) => "UNKNOWN_SORT_ATTRIBUTE",
            Self::InvalidSortDirection(_) => "INVALID_SORT_DIRECTION",
            Self::StartAfterRequiresOrderBy => "START_AFTER_REQUIRES_ORDER_BY",
        }
    }
}

pub type SearchResult<T> = Result<T, SearchError>;
