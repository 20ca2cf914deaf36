//! Aggregate computation
//!
//! Requests are grouped by field in first-seen order; each requested kind
//! is reduced independently over the same records.

use std::fmt;

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::FieldMatching;
use crate::errors::{QueryError, QueryResult};
use crate::schema::{FieldAccessor, Record, Value, ValueType};

/// Aggregate kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateKind {
    Sum,
    Average,
    Min,
    Max,
    Count,
}

impl AggregateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateKind::Sum => "sum",
            AggregateKind::Average => "average",
            AggregateKind::Min => "min",
            AggregateKind::Max => "max",
            AggregateKind::Count => "count",
        }
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One (field, kind) request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRequest {
    pub field: String,
    pub aggregate: AggregateKind,
}

impl AggregateRequest {
    pub fn new(field: impl Into<String>, aggregate: AggregateKind) -> Self {
        Self {
            field: field.into(),
            aggregate,
        }
    }
}

/// Computed aggregates: field -> kind -> value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Aggregates(IndexMap<String, IndexMap<String, Value>>);

impl Aggregates {
    pub fn get(&self, field: &str, kind: AggregateKind) -> Option<&Value> {
        self.0.get(field).and_then(|kinds| kinds.get(kind.as_str()))
    }

    /// Fields in first-seen request order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, field: &str, kind: AggregateKind, value: Value) {
        self.0
            .entry(field.to_string())
            .or_default()
            .insert(kind.as_str().to_string(), value);
    }
}

struct FieldAggregates<T> {
    name: String,
    accessor: FieldAccessor<T>,
    kinds: Vec<AggregateKind>,
}

/// Computes a fixed set of aggregate requests over record slices
pub struct Aggregator<T> {
    fields: Vec<FieldAggregates<T>>,
}

impl<T: Record> Aggregator<T> {
    /// Resolves and validates every request
    pub fn compile(requests: &[AggregateRequest], matching: FieldMatching) -> QueryResult<Self> {
        let schema = T::schema();
        let mut fields: Vec<FieldAggregates<T>> = Vec::new();

        for request in requests {
            let position = match fields.iter().position(|f| f.name == request.field) {
                Some(position) => position,
                None => {
                    fields.push(FieldAggregates {
                        name: request.field.clone(),
                        accessor: schema.resolve(&request.field, matching)?,
                        kinds: Vec::new(),
                    });
                    fields.len() - 1
                }
            };

            let entry = &mut fields[position];
            let value_type = entry.accessor.field_type().value_type;
            if matches!(request.aggregate, AggregateKind::Sum | AggregateKind::Average)
                && !value_type.is_numeric()
            {
                return Err(QueryError::UnsupportedAggregate {
                    field: request.field.clone(),
                    aggregate: request.aggregate.to_string(),
                });
            }
            if !entry.kinds.contains(&request.aggregate) {
                entry.kinds.push(request.aggregate);
            }
        }

        Ok(Self { fields })
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Computes every request over `records`. None when nothing was requested.
    pub fn compute(&self, records: &[T]) -> QueryResult<Option<Aggregates>> {
        if self.fields.is_empty() {
            return Ok(None);
        }

        let mut aggregates = Aggregates::default();
        for field in &self.fields {
            let values: Vec<Value> = records
                .iter()
                .map(|r| field.accessor.get(r))
                .filter(|v| !v.is_null())
                .collect();

            for kind in &field.kinds {
                let value = match kind {
                    AggregateKind::Count if field.accessor.field_type().nullable => {
                        Value::Int(values.len() as i64)
                    }
                    AggregateKind::Count => Value::Int(records.len() as i64),
                    AggregateKind::Min => extreme(&values, |a, b| a.sort_cmp(b).is_lt()),
                    AggregateKind::Max => extreme(&values, |a, b| a.sort_cmp(b).is_gt()),
                    AggregateKind::Sum => sum(&field.name, field.value_type(), &values)?,
                    AggregateKind::Average => average(&field.name, field.value_type(), &values)?,
                };
                aggregates.insert(&field.name, *kind, value);
            }
        }

        Ok(Some(aggregates))
    }
}

impl<T> FieldAggregates<T> {
    fn value_type(&self) -> ValueType {
        self.accessor.field_type().value_type
    }
}

/// First value that beats every later one under `better`
fn extreme(values: &[Value], better: impl Fn(&Value, &Value) -> bool) -> Value {
    let mut best: Option<&Value> = None;
    for value in values {
        match best {
            Some(current) if !better(value, current) => {}
            _ => best = Some(value),
        }
    }
    best.cloned().unwrap_or(Value::Null)
}

fn sum(field: &str, value_type: ValueType, values: &[Value]) -> QueryResult<Value> {
    let overflow = || QueryError::AggregateOverflow {
        field: field.to_string(),
    };

    match value_type {
        ValueType::Int => {
            let mut total: i64 = 0;
            for value in values {
                if let Value::Int(i) = value {
                    total = total.checked_add(*i).ok_or_else(overflow)?;
                }
            }
            Ok(Value::Int(total))
        }
        ValueType::Decimal => {
            let mut total = Decimal::ZERO;
            for value in values {
                if let Value::Decimal(d) = value {
                    total = total.checked_add(*d).ok_or_else(overflow)?;
                }
            }
            Ok(Value::Decimal(total))
        }
        _ => Ok(Value::Float(values.iter().filter_map(Value::to_f64).sum())),
    }
}

fn average(field: &str, value_type: ValueType, values: &[Value]) -> QueryResult<Value> {
    if values.is_empty() {
        return Ok(Value::Null);
    }

    match value_type {
        ValueType::Decimal => match sum(field, value_type, values)? {
            Value::Decimal(total) => Ok(total
                .checked_div(Decimal::from(values.len() as i64))
                .map_or(Value::Null, Value::Decimal)),
            _ => Ok(Value::Null),
        },
        _ => {
            let total: f64 = values.iter().filter_map(Value::to_f64).sum();
            Ok(Value::Float(total / values.len() as f64))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{employees, Employee};
    use serde_json::json;

    fn compute(requests: &[AggregateRequest]) -> QueryResult<Option<Aggregates>> {
        Aggregator::<Employee>::compile(requests, FieldMatching::Exact)?.compute(&employees())
    }

    #[test]
    fn test_salary_aggregates() {
        let aggregates = compute(&[
            AggregateRequest::new("Salary", AggregateKind::Sum),
            AggregateRequest::new("Salary", AggregateKind::Average),
            AggregateRequest::new("Salary", AggregateKind::Count),
            AggregateRequest::new("Salary", AggregateKind::Min),
            AggregateRequest::new("Salary", AggregateKind::Max),
        ])
        .unwrap()
        .unwrap();

        assert_eq!(
            aggregates.get("Salary", AggregateKind::Sum),
            Some(&Value::Decimal(Decimal::from(14850)))
        );
        assert_eq!(
            aggregates.get("Salary", AggregateKind::Average),
            Some(&Value::Decimal(Decimal::from(2970)))
        );
        assert_eq!(
            aggregates.get("Salary", AggregateKind::Count),
            Some(&Value::Int(5))
        );
        assert_eq!(
            aggregates.get("Salary", AggregateKind::Min),
            Some(&Value::Decimal(Decimal::from(1000)))
        );
        assert_eq!(
            aggregates.get("Salary", AggregateKind::Max),
            Some(&Value::Decimal(Decimal::from(6600)))
        );
    }

    #[test]
    fn test_serialized_shape() {
        let aggregates = compute(&[
            AggregateRequest::new("Number", AggregateKind::Sum),
            AggregateRequest::new("Weight", AggregateKind::Max),
            AggregateRequest::new("Number", AggregateKind::Average),
        ])
        .unwrap()
        .unwrap();

        assert_eq!(
            serde_json::to_value(&aggregates).unwrap(),
            json!({
                "Number": {"sum": 15, "average": 3.0},
                "Weight": {"max": 82.8}
            })
        );
        assert_eq!(aggregates.fields().collect::<Vec<_>>(), vec!["Number", "Weight"]);
    }

    #[test]
    fn test_count_on_nullable_counts_non_null() {
        let aggregates = compute(&[
            AggregateRequest::new("Introduce", AggregateKind::Count),
            AggregateRequest::new("Name", AggregateKind::Count),
        ])
        .unwrap()
        .unwrap();

        assert_eq!(aggregates.get("Introduce", AggregateKind::Count), Some(&Value::Int(4)));
        assert_eq!(aggregates.get("Name", AggregateKind::Count), Some(&Value::Int(5)));
    }

    #[test]
    fn test_empty_requests() {
        assert!(compute(&[]).unwrap().is_none());
    }

    #[test]
    fn test_empty_input() {
        let aggregator = Aggregator::<Employee>::compile(
            &[
                AggregateRequest::new("Number", AggregateKind::Sum),
                AggregateRequest::new("Number", AggregateKind::Average),
                AggregateRequest::new("Name", AggregateKind::Min),
            ],
            FieldMatching::Exact,
        )
        .unwrap();
        let aggregates = aggregator.compute(&[]).unwrap().unwrap();

        assert_eq!(aggregates.get("Number", AggregateKind::Sum), Some(&Value::Int(0)));
        assert_eq!(aggregates.get("Number", AggregateKind::Average), Some(&Value::Null));
        assert_eq!(aggregates.get("Name", AggregateKind::Min), Some(&Value::Null));
    }

    #[test]
    fn test_text_min_max() {
        let aggregates = compute(&[
            AggregateRequest::new("Name", AggregateKind::Min),
            AggregateRequest::new("Name", AggregateKind::Max),
        ])
        .unwrap()
        .unwrap();

        assert_eq!(aggregates.get("Name", AggregateKind::Min), Some(&Value::Text("CoCo".into())));
        assert_eq!(aggregates.get("Name", AggregateKind::Max), Some(&Value::Text("Rock".into())));
    }

    #[test]
    fn test_sum_on_text_rejected() {
        let err = compute(&[AggregateRequest::new("Name", AggregateKind::Sum)]).unwrap_err();
        assert_eq!(err.code(), "GRID_UNSUPPORTED_AGGREGATE");
    }

    #[test]
    fn test_unknown_aggregate_field() {
        let err = compute(&[AggregateRequest::new("Bonus", AggregateKind::Max)]).unwrap_err();
        assert!(matches!(err, QueryError::UnknownField { .. }));
    }

    #[test]
    fn test_integer_overflow() {
        let values = vec![Value::Int(i64::MAX), Value::Int(1)];
        assert_eq!(
            sum("Number", ValueType::Int, &values),
            Err(QueryError::AggregateOverflow {
                field: "Number".into()
            })
        );
    }

    #[test]
    fn test_kind_wire_format() {
        let request: AggregateRequest =
            serde_json::from_value(json!({"field": "Salary", "aggregate": "average"})).unwrap();
        assert_eq!(request, AggregateRequest::new("Salary", AggregateKind::Average));
    }
}
