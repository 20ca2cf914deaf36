//! Filter compilation
//!
//! Turns a normalized filter tree into an executable predicate over a
//! record type together with its textual query-expression form.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::config::{FilterMode, QueryConfig};
use crate::errors::{QueryError, QueryResult};
use crate::schema::{FieldAccessor, Record, Schema, Value, ValueType};

use super::ast::{Condition, FilterDescriptor, FilterNode, Logic, Operator};
use super::normalize::normalize;

type Matcher<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Boolean test over a record
pub struct Predicate<T> {
    test: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> Predicate<T> {
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            test: Arc::new(test),
        }
    }

    pub fn matches(&self, record: &T) -> bool {
        (self.test)(record)
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self {
            test: Arc::clone(&self.test),
        }
    }
}

/// Textual filter with positional `@n` parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryExpression {
    pub text: String,
    pub params: Vec<Value>,
}

impl fmt::Display for QueryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A filter compiled against a record type
pub struct CompiledFilter<T> {
    node: FilterNode,
    predicate: Predicate<T>,
    expression: QueryExpression,
}

impl<T> CompiledFilter<T> {
    /// The normalized tree this filter was compiled from
    pub fn node(&self) -> &FilterNode {
        &self.node
    }

    pub fn predicate(&self) -> &Predicate<T> {
        &self.predicate
    }

    pub fn expression(&self) -> &QueryExpression {
        &self.expression
    }

    pub fn matches(&self, record: &T) -> bool {
        self.predicate.matches(record)
    }
}

impl<T> fmt::Debug for CompiledFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFilter")
            .field("expression", &self.expression)
            .finish()
    }
}

/// Compiles filter trees under a query configuration
pub struct FilterCompiler<'a> {
    config: &'a QueryConfig,
}

impl<'a> FilterCompiler<'a> {
    pub fn new(config: &'a QueryConfig) -> Self {
        Self { config }
    }

    /// Compiles a wire descriptor. An empty descriptor yields no filter.
    pub fn compile_descriptor<T: Record>(
        &self,
        descriptor: &FilterDescriptor,
    ) -> QueryResult<Option<CompiledFilter<T>>> {
        if descriptor.is_empty() {
            return Ok(None);
        }
        let node = descriptor.to_node()?;
        self.compile(&node).map(Some)
    }

    /// Normalizes and compiles a filter tree for record type `T`
    pub fn compile<T: Record>(&self, node: &FilterNode) -> QueryResult<CompiledFilter<T>> {
        let schema = T::schema();
        let node = normalize(node.clone(), &schema, self.config)?;
        let mut params = Vec::new();
        let (matcher, text) = self.compile_node(&schema, &node, &mut params)?;

        Ok(CompiledFilter {
            node,
            predicate: Predicate { test: Arc::from(matcher) },
            expression: QueryExpression { text, params },
        })
    }

    fn compile_node<T: Record>(
        &self,
        schema: &Schema<T>,
        node: &FilterNode,
        params: &mut Vec<Value>,
    ) -> QueryResult<(Matcher<T>, String)> {
        match node {
            FilterNode::Leaf(condition) => self.compile_leaf(schema, condition, params),
            FilterNode::Branch { logic, children } => {
                let compiled = children
                    .iter()
                    .map(|child| self.compile_node(schema, child, params))
                    .collect::<QueryResult<Vec<_>>>()?;
                let (matchers, texts): (Vec<Matcher<T>>, Vec<String>) =
                    compiled.into_iter().unzip();

                let text = match (texts.is_empty(), logic) {
                    (true, Logic::And) => "true".to_string(),
                    (true, Logic::Or) => "false".to_string(),
                    (false, _) => format!("({})", texts.join(&format!(" {} ", logic.as_str()))),
                };
                let matcher: Matcher<T> = match logic {
                    Logic::And => Box::new(move |r: &T| matchers.iter().all(|m| m(r))),
                    Logic::Or => Box::new(move |r: &T| matchers.iter().any(|m| m(r))),
                };
                Ok((matcher, text))
            }
        }
    }

    fn compile_leaf<T: Record>(
        &self,
        schema: &Schema<T>,
        condition: &Condition,
        params: &mut Vec<Value>,
    ) -> QueryResult<(Matcher<T>, String)> {
        let accessor = schema.resolve(&condition.field, self.config.field_matching)?;
        let field = accessor.path().to_string();
        let value_type = accessor.field_type().value_type;
        let op = condition.operator;
        let stringify = self.check_operator(op, &field, value_type)?;

        match op {
            Operator::IsNull | Operator::IsNotNull => {
                let want_null = op == Operator::IsNull;
                let symbol = if want_null { "=" } else { "!=" };
                let matcher: Matcher<T> =
                    Box::new(move |r: &T| accessor.get(r).is_null() == want_null);
                Ok((matcher, format!("{} {} null", field, symbol)))
            }
            Operator::IsEmpty | Operator::IsNotEmpty => {
                let want_empty = op == Operator::IsEmpty;
                let symbol = if want_empty { "=" } else { "!=" };
                let matcher: Matcher<T> =
                    Box::new(move |r: &T| is_empty_text(&accessor.get(r)) == want_empty);
                Ok((matcher, format!("{} {} String.Empty", field, symbol)))
            }
            Operator::IsNullOrEmpty | Operator::IsNotNullOrEmpty => {
                let want = op == Operator::IsNullOrEmpty;
                let negation = if want { "" } else { "!" };
                let matcher: Matcher<T> = Box::new(move |r: &T| {
                    let value = accessor.get(r);
                    (value.is_null() || is_empty_text(&value)) == want
                });
                Ok((matcher, format!("{}String.IsNullOrEmpty({})", negation, field)))
            }
            Operator::StartsWith
            | Operator::EndsWith
            | Operator::Contains
            | Operator::DoesNotContain => compile_substring(accessor, condition, stringify, params),
            Operator::Eq
            | Operator::Neq
            | Operator::Lt
            | Operator::Lte
            | Operator::Gt
            | Operator::Gte => compile_comparison(accessor, condition, value_type, params),
        }
    }

    /// Validates the operator against the field type. Returns true when the
    /// field must be stringified.
    fn check_operator(
        &self,
        op: Operator,
        field: &str,
        value_type: ValueType,
    ) -> QueryResult<bool> {
        if op.is_string_only() && !value_type.is_text() {
            if op.is_substring() && self.config.filter_mode == FilterMode::Expression {
                return Ok(true);
            }
            return Err(unsupported(op, field, "a text field"));
        }
        if op.is_ordering() && !value_type.is_ordered() {
            return Err(unsupported(op, field, "an ordered field"));
        }
        Ok(false)
    }
}

fn unsupported(op: Operator, field: &str, requirement: &'static str) -> QueryError {
    QueryError::UnsupportedOperator {
        operator: op.as_str().to_string(),
        field: field.to_string(),
        requirement,
    }
}

fn is_empty_text(value: &Value) -> bool {
    matches!(value.as_text(), Some(""))
}

fn push_param(params: &mut Vec<Value>, value: Value) -> String {
    params.push(value);
    format!("@{}", params.len() - 1)
}

fn lower(value: Value) -> Value {
    match value {
        Value::Text(s) => Value::Text(s.to_lowercase()),
        other => other,
    }
}

fn compile_substring<T: Record>(
    accessor: FieldAccessor<T>,
    condition: &Condition,
    stringify: bool,
    params: &mut Vec<Value>,
) -> QueryResult<(Matcher<T>, String)> {
    let field = accessor.path().to_string();
    let op = condition.operator;
    let ignore_case = condition.ignore_case;

    let needle = match &condition.value {
        Value::Text(s) => s.clone(),
        Value::Null => return Err(QueryError::type_coercion(&field, "text", "null")),
        other if stringify => other.to_string(),
        other => {
            return Err(QueryError::type_coercion(
                &field,
                ValueType::Text.as_str(),
                other.to_string(),
            ))
        }
    };
    let needle = if ignore_case {
        needle.to_lowercase()
    } else {
        needle
    };

    let method = match op {
        Operator::StartsWith => "StartsWith",
        Operator::EndsWith => "EndsWith",
        _ => "Contains",
    };
    let slot = push_param(params, Value::Text(needle.clone()));
    let mut target = field.clone();
    if stringify {
        target.push_str(".ToString()");
    }
    if ignore_case {
        target.push_str(".ToLower()");
    }
    let call = format!("{}.{}({})", target, method, slot);
    let text = match (op, stringify) {
        (Operator::DoesNotContain, true) => format!("({} != null && !{})", field, call),
        (_, true) => format!("({} != null && {})", field, call),
        (Operator::DoesNotContain, false) => format!("!{}", call),
        (_, false) => call,
    };

    let matcher: Matcher<T> = Box::new(move |r: &T| {
        let haystack = match accessor.get(r) {
            Value::Null => return false,
            Value::Text(s) => s,
            other => other.to_string(),
        };
        let haystack = if ignore_case {
            haystack.to_lowercase()
        } else {
            haystack
        };
        match op {
            Operator::StartsWith => haystack.starts_with(&needle),
            Operator::EndsWith => haystack.ends_with(&needle),
            Operator::Contains => haystack.contains(&needle),
            _ => !haystack.contains(&needle),
        }
    });

    Ok((matcher, text))
}

fn compile_comparison<T: Record>(
    accessor: FieldAccessor<T>,
    condition: &Condition,
    value_type: ValueType,
    params: &mut Vec<Value>,
) -> QueryResult<(Matcher<T>, String)> {
    let field = accessor.path().to_string();
    let op = condition.operator;

    // Numbers compare across kinds, so a fractional bound on an
    // integer field is kept as is
    let literal = match condition.value.coerce(value_type) {
        Some(v) => v,
        None if value_type.is_numeric() && condition.value.to_f64().is_some() => {
            condition.value.clone()
        }
        None => {
            return Err(QueryError::type_coercion(
                &field,
                value_type.as_str(),
                condition.value.to_string(),
            ))
        }
    };

    let ignore_case =
        condition.ignore_case && value_type.is_text() && matches!(op, Operator::Eq | Operator::Neq);
    let literal = if ignore_case { lower(literal) } else { literal };

    let symbol = match op {
        Operator::Eq => "=",
        Operator::Neq => "!=",
        Operator::Lt => "<",
        Operator::Lte => "<=",
        Operator::Gt => ">",
        _ => ">=",
    };
    let slot = push_param(params, literal.clone());
    let lhs = if ignore_case {
        format!("{}.ToLower()", field)
    } else {
        field
    };
    let text = format!("{} {} {}", lhs, symbol, slot);

    let matcher: Matcher<T> = Box::new(move |r: &T| {
        let actual = accessor.get(r);
        let actual = if ignore_case { lower(actual) } else { actual };
        match op {
            Operator::Eq => actual.compare(&literal) == Some(Ordering::Equal),
            Operator::Neq => actual.compare(&literal) != Some(Ordering::Equal),
            _ if actual.is_null() || literal.is_null() => false,
            Operator::Lt => actual.compare(&literal) == Some(Ordering::Less),
            Operator::Lte => matches!(
                actual.compare(&literal),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Operator::Gt => actual.compare(&literal) == Some(Ordering::Greater),
            _ => matches!(
                actual.compare(&literal),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    });

    Ok((matcher, text))
}
