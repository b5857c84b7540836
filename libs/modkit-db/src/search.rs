//! `search_core` predicate IR → `sea_orm::Condition` lowering (plan in, SQL out).
//!
//! Compilation and validation belong to `search_core`; this module only
//! consumes an already compiled [`SearchPlan`]. Column names come from the
//! static schema, every literal becomes a bound parameter.

use sea_orm::{
    sea_query::{Alias, Expr, IntoColumnRef, LikeExpr, Order, SimpleExpr},
    Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use search_core::{CompareOperator, Literal, Predicate, SearchPlan, SortDir, SortKey, Window};

/// LIKE escape character used by every pattern the compiler produces.
pub const LIKE_ESCAPE: char = '\\';

/* ---------- values and columns ---------- */

pub fn literal_to_value(lit: &Literal) -> sea_orm::Value {
    match lit {
        Literal::String(s) => sea_orm::Value::String(Some(Box::new(s.clone()))),
        Literal::Bool(b) => sea_orm::Value::Bool(Some(*b)),
        Literal::Int(i) => sea_orm::Value::BigInt(Some(*i)),
        Literal::Timestamp(ts) => sea_orm::Value::ChronoDateTimeUtc(Some(Box::new(*ts))),
        Literal::Uuid(u) => sea_orm::Value::Uuid(Some(Box::new(*u))),
    }
}

fn col(column: &search_core::ColumnRef) -> Expr {
    Expr::col((Alias::new(column.table), Alias::new(column.column)))
}

fn col_expr(column: &search_core::ColumnRef) -> SimpleExpr {
    SimpleExpr::Column((Alias::new(column.table), Alias::new(column.column)).into_column_ref())
}

fn like(pattern: &str) -> LikeExpr {
    LikeExpr::new(pattern).escape(LIKE_ESCAPE)
}

fn never() -> Condition {
    Condition::all().add(Expr::cust("1=0"))
}

/* ---------- Predicate -> Condition ---------- */

pub fn predicate_to_condition(p: &Predicate) -> Condition {
    match p {
        Predicate::Always => Condition::all(),
        Predicate::Never => never(),
        Predicate::Compare { column, op, value } => {
            let v = literal_to_value(value);
            let e = match op {
                CompareOperator::Eq => col(column).eq(v),
                CompareOperator::Ne => col(column).ne(v),
                CompareOperator::Gt => col(column).gt(v),
                CompareOperator::Ge => col(column).gte(v),
                CompareOperator::Lt => col(column).lt(v),
                CompareOperator::Le => col(column).lte(v),
            };
            Condition::all().add(e)
        }
        Predicate::Like {
            column,
            pattern,
            negated,
        } => {
            let e = if *negated {
                col(column).not_like(like(pattern))
            } else {
                col(column).like(like(pattern))
            };
            Condition::all().add(e)
        }
        Predicate::InList {
            column,
            values,
            negated,
        } => {
            if values.is_empty() {
                // IN () → always false, NOT IN () → always true
                return if *negated { Condition::all() } else { never() };
            }
            let vals: Vec<sea_orm::Value> = values.iter().map(literal_to_value).collect();
            let e = if *negated {
                col(column).is_not_in(vals)
            } else {
                col(column).is_in(vals)
            };
            Condition::all().add(e)
        }
        Predicate::Between {
            column,
            low,
            high,
            negated,
        } => {
            let (lo, hi) = (literal_to_value(low), literal_to_value(high));
            let e = if *negated {
                col(column).not_between(lo, hi)
            } else {
                col(column).between(lo, hi)
            };
            Condition::all().add(e)
        }
        Predicate::ContainsAll {
            column,
            elements,
            negated,
        } => {
            let all = elements.iter().fold(Condition::all(), |c, element| {
                c.add(col(column).like(like(&search_core::literal::array_element_pattern(element))))
            });
            if *negated {
                all.not()
            } else {
                all
            }
        }
        Predicate::ColumnsEqual(a, b) => Condition::all().add(
            col(a).equals((Alias::new(b.table), Alias::new(b.column))),
        ),
        Predicate::IsNull(column) => Condition::all().add(col(column).is_null()),
        Predicate::And(parts) => parts
            .iter()
            .fold(Condition::all(), |c, p| c.add(predicate_to_condition(p))),
        Predicate::Or(parts) if parts.is_empty() => never(),
        Predicate::Or(parts) => parts
            .iter()
            .fold(Condition::any(), |c, p| c.add(predicate_to_condition(p))),
    }
}

/* ---------- Select extensions ---------- */

/// Apply the pieces of a compiled search to a SeaORM `Select<E>`.
pub trait SearchSelectExt: Sized {
    fn apply_search_filter(self, predicate: &Predicate) -> Self;
    fn apply_search_order(self, order: &[SortKey]) -> Self;
    fn apply_window(self, window: Window) -> Self;

    /// Filter, ordering, then offset and row cap.
    fn apply_search_plan(self, plan: &SearchPlan) -> Self {
        self.apply_search_filter(plan.filter())
            .apply_search_order(plan.order())
            .apply_window(plan.window())
    }
}

impl<E> SearchSelectExt for Select<E>
where
    E: EntityTrait,
{
    fn apply_search_filter(self, predicate: &Predicate) -> Self {
        self.filter(predicate_to_condition(predicate))
    }

    fn apply_search_order(self, order: &[SortKey]) -> Self {
        order.iter().fold(self, |query, key| {
            let ord = match key.dir {
                SortDir::Asc => Order::Asc,
                SortDir::Desc => Order::Desc,
            };
            query.order_by(col_expr(&key.column), ord)
        })
    }

    fn apply_window(self, window: Window) -> Self {
        let mut query = self;
        match window.limit {
            Some(limit) => query = query.limit(limit),
            // SQLite rejects OFFSET without LIMIT.
            None if window.skip > 0 => query = query.limit(i64::MAX as u64),
            None => {}
        }
        if window.skip > 0 {
            query = query.offset(window.skip);
        }
        query
    }
}
