//! Filter value normalization
//!
//! Runs once over the whole tree before compilation:
//! - date-time strings on date-time fields are parsed, and instants are
//!   converted to local wall-clock time
//! - `eq` against a local midnight on a date-time field becomes a
//!   whole-day range
//! - binary floating literals become fixed-point decimals
//!
//! Leaves on other fields keep their literal, so a date-like string
//! compared with a text field stays text.

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::config::QueryConfig;
use crate::errors::QueryResult;
use crate::schema::{Record, Schema, Value, ValueType};

use super::ast::{Condition, FilterNode, Logic, Operator};

/// Rewrites a filter tree into its normalized form for record type `T`.
///
/// Fails only when an instant must be localized under an invalid offset.
pub fn normalize<T: Record>(
    node: FilterNode,
    schema: &Schema<T>,
    config: &QueryConfig,
) -> QueryResult<FilterNode> {
    match node {
        FilterNode::Branch { logic, children } => Ok(FilterNode::Branch {
            logic,
            children: children
                .into_iter()
                .map(|child| normalize(child, schema, config))
                .collect::<QueryResult<Vec<_>>>()?,
        }),
        FilterNode::Leaf(condition) => normalize_condition(condition, schema, config),
    }
}

fn normalize_condition<T: Record>(
    mut condition: Condition,
    schema: &Schema<T>,
    config: &QueryConfig,
) -> QueryResult<FilterNode> {
    // Unknown fields are left for the compiler to report
    let date_field = schema
        .resolve(&condition.field, config.field_matching)
        .map_or(false, |a| a.field_type().value_type == ValueType::DateTime);

    condition.value = match condition.value {
        Value::Text(s) if date_field => Value::parse_date_time(&s).unwrap_or(Value::Text(s)),
        other => other,
    };
    condition.value = match condition.value {
        Value::Timestamp(ts) if date_field => Value::DateTime(config.to_local(&ts)?),
        Value::Float(f) => Decimal::from_f64(f).map_or(Value::Float(f), Value::Decimal),
        other => other,
    };

    Ok(match condition.value {
        Value::DateTime(local)
            if date_field && condition.operator == Operator::Eq && is_midnight(&local) =>
        {
            expand_day(condition, local)
        }
        _ => FilterNode::Leaf(condition),
    })
}

/// Midnight is judged on hours, minutes and seconds only
fn is_midnight(dt: &NaiveDateTime) -> bool {
    dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0
}

fn expand_day(condition: Condition, local: NaiveDateTime) -> FilterNode {
    let day = local.date();
    let start = day.and_time(NaiveTime::MIN);
    let end = day.and_time(end_of_day());

    let bound = |operator, value: NaiveDateTime| {
        FilterNode::Leaf(Condition {
            field: condition.field.clone(),
            operator,
            value: Value::DateTime(value),
            ignore_case: condition.ignore_case,
        })
    };

    FilterNode::Branch {
        logic: Logic::And,
        children: vec![bound(Operator::Gte, start), bound(Operator::Lte, end)],
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN)
}
