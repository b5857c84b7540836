//! `attribute.operator.value` parsing and operator/type validation.

use tracing::trace;

use crate::error::{LiteralError, SearchError, SearchResult};
use crate::literal::{find_unescaped, like_pattern, parse_literal, split_unescaped, unescape, Literal};
use crate::op::{CompareOperator, SearchOp};
use crate::predicate::Predicate;
use crate::schema::{ColumnDef, ColumnKind, SchemaTable};

/// Validated right-hand side of a condition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Compare(CompareOperator, Literal),
    /// SQL LIKE pattern with `\` as escape character.
    Pattern(String),
    List(Vec<Literal>),
    Range(Literal, Literal),
    /// Elements an array column must (or must not) contain.
    Elements(Vec<String>),
}

/// A schema-checked condition. Only [`parse_condition`] builds these, so
/// every instance has passed operator/type validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Condition {
    def: ColumnDef,
    op: SearchOp,
    operand: Operand,
}

impl Condition {
    pub fn attribute(&self) -> &'static str {
        self.def.name
    }

    pub fn column(&self) -> &ColumnDef {
        &self.def
    }

    /// Effective operator (`In` on an array column reads back as `Contains`).
    pub fn op(&self) -> SearchOp {
        self.op
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    /// Lower to the predicate IR. Negated operators on a nullable column
    /// also match rows where the column is absent.
    pub fn into_predicate(self) -> Predicate {
        let column = self.def.column;
        let include_absent = self.def.nullable && self.op.is_negated();
        let predicate = match (self.op, self.operand) {
            (_, Operand::Compare(op, value)) => Predicate::Compare { column, op, value },
            (op, Operand::Pattern(pattern)) => Predicate::Like {
                column,
                pattern,
                negated: op == SearchOp::Nlike,
            },
            (op, Operand::List(values)) => Predicate::InList {
                column,
                values,
                negated: op == SearchOp::Nin,
            },
            (op, Operand::Range(low, high)) => Predicate::Between {
                column,
                low,
                high,
                negated: op == SearchOp::Nbetween,
            },
            (op, Operand::Elements(elements)) => Predicate::ContainsAll {
                column,
                elements,
                negated: op == SearchOp::Ncontains,
            },
        };
        if include_absent {
            predicate.or(Predicate::IsNull(column))
        } else {
            predicate
        }
    }
}

/// Split `attribute.operator.value` on the first two unescaped dots.
pub(crate) fn split_condition(raw: &str) -> SearchResult<(&str, &str, &str)> {
    let dots = find_unescaped(raw, '.', 2);
    let [first, second] = dots.as_slice() else {
        return Err(SearchError::MalformedCondition(raw.to_string()));
    };
    let attribute = raw[..*first].trim();
    let op = raw[first + 1..*second].trim();
    if attribute.is_empty() || op.is_empty() {
        return Err(SearchError::MalformedCondition(raw.to_string()));
    }
    Ok((attribute, op, &raw[second + 1..]))
}

/// Resolve the attribute of a raw condition without validating the rest.
pub(crate) fn condition_attribute<'s>(schema: &'s SchemaTable, raw: &str) -> Option<&'s ColumnDef> {
    let (attribute, _, _) = split_condition(raw).ok()?;
    schema.resolve(attribute)
}

/// Parse and validate one `attribute.operator.value` condition.
pub fn parse_condition(schema: &SchemaTable, raw: &str) -> SearchResult<Condition> {
    let (attribute, op, value) = split_condition(raw)?;
    let def = *schema
        .resolve(attribute)
        .ok_or_else(|| SearchError::UnknownAttribute(attribute.to_string()))?;
    let op = SearchOp::parse(op)?;
    build_condition(def, op, value)
}

/// Validate `op` and a raw (still escaped) `value` against a resolved column.
pub(crate) fn build_condition(def: ColumnDef, op: SearchOp, value: &str) -> SearchResult<Condition> {
    let op = def.kind.effective_op(op);
    if !def.kind.allows(op) {
        return Err(SearchError::OperatorNotAllowedForType {
            attribute: def.name.to_string(),
            op,
            kind: def.kind,
        });
    }
    let operand = validate_operand(&def, op, value)?;
    trace!(attribute = def.name, op = %op, "condition validated");
    Ok(Condition { def, op, operand })
}

fn validate_operand(def: &ColumnDef, op: SearchOp, raw: &str) -> SearchResult<Operand> {
    let attribute = def.name;
    let kind = def.kind;

    if matches!(op, SearchOp::Like | SearchOp::Nlike) {
        return Ok(Operand::Pattern(like_pattern(raw)));
    }

    if let Some(cmp) = op.compare() {
        return Ok(Operand::Compare(
            cmp,
            parse_literal(attribute, kind, &unescape(raw))?,
        ));
    }

    let items: Vec<String> = split_unescaped(raw, ',').into_iter().map(unescape).collect();
    match op {
        SearchOp::Between | SearchOp::Nbetween => {
            let [low, high] = items.as_slice() else {
                return Err(SearchError::invalid_literal(
                    attribute,
                    raw,
                    LiteralError::Arity {
                        expected: 2,
                        got: items.len(),
                    },
                ));
            };
            Ok(Operand::Range(
                parse_literal(attribute, kind, low)?,
                parse_literal(attribute, kind, high)?,
            ))
        }
        SearchOp::Contains | SearchOp::Ncontains => {
            debug_assert_eq!(kind, ColumnKind::StringArray);
            Ok(Operand::Elements(items))
        }
        _ => Ok(Operand::List(
            items
                .iter()
                .map(|item| parse_literal(attribute, kind, item))
                .collect::<SearchResult<Vec<_>>>()?,
        )),
    }
}
