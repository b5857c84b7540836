//! Backend-neutral predicate IR.
//!
//! Values are immutable: `and`/`or` consume their operands and return a new
//! predicate, so optional fragments (search, version scope, authorization
//! scope, keyset bound) compose without order-of-mutation effects.

use std::fmt;

use crate::literal::Literal;
use crate::op::CompareOperator;
use crate::schema::ColumnRef;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    /// Matches every row.
    Always,
    /// Matches no row.
    Never,
    Compare {
        column: ColumnRef,
        op: CompareOperator,
        value: Literal,
    },
    /// `pattern` uses `\` as LIKE escape character.
    Like {
        column: ColumnRef,
        pattern: String,
        negated: bool,
    },
    InList {
        column: ColumnRef,
        values: Vec<Literal>,
        negated: bool,
    },
    Between {
        column: ColumnRef,
        low: Literal,
        high: Literal,
        negated: bool,
    },
    /// Array column holds every element (or, negated, not all of them).
    ContainsAll {
        column: ColumnRef,
        elements: Vec<String>,
        negated: bool,
    },
    ColumnsEqual(ColumnRef, ColumnRef),
    /// Column holds no value.
    IsNull(ColumnRef),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn equals(column: ColumnRef, value: Literal) -> Self {
        Self::Compare {
            column,
            op: CompareOperator::Eq,
            value,
        }
    }

    /// `column IN (values)`; an empty set matches nothing.
    pub fn in_strings<I, S>(column: ColumnRef, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<Literal> = values
            .into_iter()
            .map(|s| Literal::String(s.into()))
            .collect();
        if values.is_empty() {
            return Self::Never;
        }
        Self::InList {
            column,
            values,
            negated: false,
        }
    }

    pub fn and(self, rhs: Predicate) -> Self {
        match (self, rhs) {
            (Self::Always, p) | (p, Self::Always) => p,
            (Self::Never, _) | (_, Self::Never) => Self::Never,
            (Self::And(mut l), Self::And(r)) => {
                l.extend(r);
                Self::And(l)
            }
            (Self::And(mut l), p) => {
                l.push(p);
                Self::And(l)
            }
            (p, Self::And(mut r)) => {
                r.insert(0, p);
                Self::And(r)
            }
            (l, r) => Self::And(vec![l, r]),
        }
    }

    pub fn or(self, rhs: Predicate) -> Self {
        match (self, rhs) {
            (Self::Never, p) | (p, Self::Never) => p,
            (Self::Always, _) | (_, Self::Always) => Self::Always,
            (Self::Or(mut l), Self::Or(r)) => {
                l.extend(r);
                Self::Or(l)
            }
            (Self::Or(mut l), p) => {
                l.push(p);
                Self::Or(l)
            }
            (p, Self::Or(mut r)) => {
                r.insert(0, p);
                Self::Or(r)
            }
            (l, r) => Self::Or(vec![l, r]),
        }
    }

    pub fn all<I: IntoIterator<Item = Predicate>>(parts: I) -> Self {
        parts.into_iter().fold(Self::Always, Self::and)
    }

    pub fn any<I: IntoIterator<Item = Predicate>>(parts: I) -> Self {
        parts.into_iter().fold(Self::Never, Self::or)
    }
}

fn join(f: &mut fmt::Formatter<'_>, parts: &[Predicate], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, p) in parts.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{p}")?;
    }
    f.write_str(")")
}

fn list(values: &[Literal]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let not = |negated: &bool| if *negated { "NOT " } else { "" };
        match self {
            Self::Always => f.write_str("TRUE"),
            Self::Never => f.write_str("FALSE"),
            Self::Compare { column, op, value } => write!(f, "{column} {} {value}", op.sql()),
            Self::Like {
                column,
                pattern,
                negated,
            } => write!(f, "{column} {}LIKE '{pattern}'", not(negated)),
            Self::InList {
                column,
                values,
                negated,
            } => write!(f, "{column} {}IN ({})", not(negated), list(values)),
            Self::Between {
                column,
                low,
                high,
                negated,
            } => write!(f, "{column} {}BETWEEN {low} AND {high}", not(negated)),
            Self::ContainsAll {
                column,
                elements,
                negated,
            } => write!(f, "{column} {}CONTAINS [{}]", not(negated), elements.join(", ")),
            Self::ColumnsEqual(a, b) => write!(f, "{a} = {b}"),
            Self::IsNull(column) => write!(f, "{column} IS NULL"),
            Self::And(parts) => join(f, parts, " AND "),
            Self::Or(parts) => join(f, parts, " OR "),
        }
    }
}
