use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SearchError, SearchResult};

/// Search operators. `Contains`/`Ncontains` are never written by clients;
/// they are what `In`/`Nin` become on array-typed columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    Nlike,
    In,
    Nin,
    Between,
    Nbetween,
    Contains,
    Ncontains,
}

impl SearchOp {
    /// Parse a client-supplied operator, case-insensitive.
    pub fn parse(s: &str) -> SearchResult<Self> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "eq" => Self::Eq,
            "neq" => Self::Neq,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "like" => Self::Like,
            "nlike" => Self::Nlike,
            "in" => Self::In,
            "nin" => Self::Nin,
            "between" => Self::Between,
            "nbetween" => Self::Nbetween,
            _ => return Err(SearchError::UnsupportedOperator(s.to_string())),
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Like => "like",
            Self::Nlike => "nlike",
            Self::In => "in",
            Self::Nin => "nin",
            Self::Between => "between",
            Self::Nbetween => "nbetween",
            Self::Contains => "contains",
            Self::Ncontains => "ncontains",
        }
    }

    /// Operators that select rows *not* matching the value.
    pub fn is_negated(self) -> bool {
        matches!(
            self,
            Self::Neq | Self::Nlike | Self::Nin | Self::Nbetween | Self::Ncontains
        )
    }

    /// Operators whose value is a comma-separated list.
    pub fn takes_list(self) -> bool {
        matches!(
            self,
            Self::In
                | Self::Nin
                | Self::Between
                | Self::Nbetween
                | Self::Contains
                | Self::Ncontains
        )
    }

    pub(crate) fn compare(self) -> Option<CompareOperator> {
        Some(match self {
            Self::Eq => CompareOperator::Eq,
            Self::Neq => CompareOperator::Ne,
            Self::Lt => CompareOperator::Lt,
            Self::Lte => CompareOperator::Le,
            Self::Gt => CompareOperator::Gt,
            Self::Gte => CompareOperator::Ge,
            _ => return None,
        })
    }
}

impl fmt::Display for SearchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

/// Relational operator of a single-value predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareOperator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOperator {
    pub fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }
}
