//! Typed values flowing through filters, sorts, aggregates and group keys

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// Layout accepted for offset-less date-time strings
const NAIVE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Declared type of a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Decimal,
    Text,
    DateTime,
    Uuid,
}

impl ValueType {
    /// Returns the type name used in error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Decimal => "decimal",
            ValueType::Text => "text",
            ValueType::DateTime => "datetime",
            ValueType::Uuid => "uuid",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Int | ValueType::Float | ValueType::Decimal)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ValueType::Text)
    }

    /// Returns true if `<`, `>` and friends are defined for this type
    pub fn is_ordered(&self) -> bool {
        !matches!(self, ValueType::Bool)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declared type plus nullability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldType {
    pub value_type: ValueType,
    pub nullable: bool,
}

impl FieldType {
    pub fn required(value_type: ValueType) -> Self {
        Self {
            value_type,
            nullable: false,
        }
    }

    pub fn nullable(value_type: ValueType) -> Self {
        Self {
            value_type,
            nullable: true,
        }
    }

    /// Same type, marked nullable
    pub fn into_nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }
}

/// A single scalar value
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    /// Wall-clock date-time without an offset
    DateTime(NaiveDateTime),
    /// Instant with an explicit offset, as supplied by clients
    Timestamp(DateTime<FixedOffset>),
    Uuid(Uuid),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Lifts a wire value into a typed value.
    ///
    /// Strings stay text; date-time strings are parsed once the target
    /// field type is known. Returns None for arrays and objects.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value as Json;

        match value {
            Json::Null => Some(Value::Null),
            Json::Bool(b) => Some(Value::Bool(*b)),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Some(Value::Int(i)),
                None => n.as_f64().map(Value::Float),
            },
            Json::String(s) => Some(Value::Text(s.clone())),
            Json::Array(_) | Json::Object(_) => None,
        }
    }

    /// Parses an RFC 3339 instant or an offset-less `YYYY-MM-DDTHH:MM:SS[.f]`
    /// wall-clock time
    pub fn parse_date_time(s: &str) -> Option<Self> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return Some(Value::Timestamp(ts));
        }
        NaiveDateTime::parse_from_str(s, NAIVE_DATETIME_FORMAT)
            .ok()
            .map(Value::DateTime)
    }

    /// Converts this value to the given field type.
    ///
    /// Null converts to every type. Returns None when no conversion exists.
    pub fn coerce(&self, target: ValueType) -> Option<Value> {
        match (target, self) {
            (_, Value::Null) => Some(Value::Null),

            (ValueType::Bool, Value::Bool(b)) => Some(Value::Bool(*b)),
            (ValueType::Bool, Value::Text(s)) => bool::from_str(s).ok().map(Value::Bool),

            (ValueType::Int, Value::Int(i)) => Some(Value::Int(*i)),
            (ValueType::Int, Value::Float(f)) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(Value::Int(*f as i64))
                } else {
                    None
                }
            }
            (ValueType::Int, Value::Decimal(d)) => {
                if d.fract().is_zero() {
                    d.to_i64().map(Value::Int)
                } else {
                    None
                }
            }
            (ValueType::Int, Value::Text(s)) => s.trim().parse().ok().map(Value::Int),

            (ValueType::Float, Value::Int(i)) => Some(Value::Float(*i as f64)),
            (ValueType::Float, Value::Float(f)) => Some(Value::Float(*f)),
            (ValueType::Float, Value::Decimal(d)) => d.to_f64().map(Value::Float),
            (ValueType::Float, Value::Text(s)) => s.trim().parse().ok().map(Value::Float),

            (ValueType::Decimal, Value::Int(i)) => Some(Value::Decimal(Decimal::from(*i))),
            (ValueType::Decimal, Value::Float(f)) => Decimal::from_f64(*f).map(Value::Decimal),
            (ValueType::Decimal, Value::Decimal(d)) => Some(Value::Decimal(*d)),
            (ValueType::Decimal, Value::Text(s)) => {
                Decimal::from_str(s.trim()).ok().map(Value::Decimal)
            }

            (ValueType::Text, Value::Text(s)) => Some(Value::Text(s.clone())),
            (ValueType::Text, Value::DateTime(_) | Value::Timestamp(_)) => {
                Some(Value::Text(self.to_string()))
            }

            (ValueType::DateTime, Value::DateTime(dt)) => Some(Value::DateTime(*dt)),
            (ValueType::DateTime, Value::Timestamp(ts)) => Some(Value::DateTime(ts.naive_local())),
            (ValueType::DateTime, Value::Text(s)) => match Self::parse_date_time(s) {
                Some(Value::Timestamp(ts)) => Some(Value::DateTime(ts.naive_local())),
                other => other,
            },

            (ValueType::Uuid, Value::Uuid(u)) => Some(Value::Uuid(*u)),
            (ValueType::Uuid, Value::Text(s)) => Uuid::parse_str(s.trim()).ok().map(Value::Uuid),

            _ => None,
        }
    }

    /// Natural ordering between two comparable values.
    ///
    /// Numbers compare across Int, Float and Decimal. Returns None for
    /// values of unrelated kinds.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Decimal(b)) => Some(Decimal::from(*a).cmp(b)),
            (Value::Decimal(a), Value::Int(b)) => Some(a.cmp(&Decimal::from(*b))),
            (Value::Float(_), _) | (_, Value::Float(_)) => {
                let (a, b) = (self.to_f64()?, other.to_f64()?);
                a.partial_cmp(&b)
            }
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total ordering used for sorting: nulls first, then natural ordering,
    /// unrelated kinds ordered by kind.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self
                .compare(other)
                .unwrap_or_else(|| self.kind_rank().cmp(&other.kind_rank())),
        }
    }

    /// Numeric view of the value, if any
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) | Value::Decimal(_) => 2,
            Value::Text(_) => 3,
            Value::DateTime(_) => 4,
            Value::Timestamp(_) => 5,
            Value::Uuid(_) => 6,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_bits(*a) == float_bits(*b),
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Uuid(a), Value::Uuid(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind_rank().hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => float_bits(*f).hash(state),
            Value::Decimal(d) => d.hash(state),
            Value::Text(s) => s.hash(state),
            Value::DateTime(dt) => dt.hash(state),
            Value::Timestamp(ts) => ts.hash(state),
            Value::Uuid(u) => u.hash(state),
        }
    }
}

/// Bit pattern with -0.0 folded into 0.0 and a single NaN
fn float_bits(f: f64) -> u64 {
    if f == 0.0 {
        0.0f64.to_bits()
    } else if f.is_nan() {
        f64::NAN.to_bits()
    } else {
        f.to_bits()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Text(s) => write!(f, "{}", s),
            Value::DateTime(dt) => write!(f, "{}", dt.format(NAIVE_DATETIME_FORMAT)),
            Value::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Value::Uuid(u) => write!(f, "{}", u),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Decimal(d) => match (d.fract().is_zero(), d.to_i64()) {
                (true, Some(i)) => serializer.serialize_i64(i),
                _ => match d.to_f64() {
                    Some(v) => serializer.serialize_f64(v),
                    None => serializer.serialize_str(&d.to_string()),
                },
            },
            Value::Text(_) | Value::DateTime(_) | Value::Timestamp(_) | Value::Uuid(_) => {
                serializer.collect_str(self)
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_numbers() {
        assert_eq!(Value::from_json(&json!(42)), Some(Value::Int(42)));
        assert_eq!(Value::from_json(&json!(69.2)), Some(Value::Float(69.2)));
        assert_eq!(Value::from_json(&json!(null)), Some(Value::Null));
        assert_eq!(Value::from_json(&json!([1, 2])), None);
    }

    #[test]
    fn test_from_json_strings_stay_text() {
        assert_eq!(
            Value::from_json(&json!("2020-01-01T00:00:00Z")),
            Some(Value::Text("2020-01-01T00:00:00Z".into()))
        );
        assert_eq!(
            Value::from_json(&json!("Microsoft")),
            Some(Value::Text("Microsoft".into()))
        );
    }

    #[test]
    fn test_parse_date_time() {
        match Value::parse_date_time("1986-10-09T16:00:00.000Z") {
            Some(Value::Timestamp(ts)) => assert_eq!(ts.offset().local_minus_utc(), 0),
            other => panic!("expected timestamp, got {:?}", other),
        }
        assert!(matches!(
            Value::parse_date_time("2000-05-05T00:00:00"),
            Some(Value::DateTime(_))
        ));
        assert_eq!(Value::parse_date_time("Microsoft"), None);
    }

    #[test]
    fn test_coerce_date_time_text() {
        assert!(matches!(
            Value::Text("2000-05-05T00:00:00".into()).coerce(ValueType::DateTime),
            Some(Value::DateTime(_))
        ));
        let local = Value::parse_date_time("2000-05-05T10:30:00").unwrap();
        assert_eq!(
            local.coerce(ValueType::Text),
            Some(Value::Text("2000-05-05T10:30:00".into()))
        );
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(Value::Float(3.0).coerce(ValueType::Int), Some(Value::Int(3)));
        assert_eq!(Value::Float(3.5).coerce(ValueType::Int), None);
        assert_eq!(
            Value::Int(7).coerce(ValueType::Decimal),
            Some(Value::Decimal(Decimal::from(7)))
        );
        assert_eq!(
            Value::Text("12".into()).coerce(ValueType::Int),
            Some(Value::Int(12))
        );
        assert_eq!(Value::Text("abc".into()).coerce(ValueType::Int), None);
        assert_eq!(Value::Null.coerce(ValueType::Uuid), Some(Value::Null));
    }

    #[test]
    fn test_coerce_text_is_strict() {
        assert_eq!(Value::Int(1).coerce(ValueType::Text), None);
        assert_eq!(Value::Bool(true).coerce(ValueType::Int), None);
    }

    #[test]
    fn test_compare_across_numeric_kinds() {
        let d = Value::Decimal(Decimal::new(9990, 1));
        assert_eq!(Value::Int(1000).compare(&d), Some(Ordering::Greater));
        assert_eq!(Value::Float(48.5).compare(&Value::Int(48)), Some(Ordering::Greater));
        assert_eq!(Value::Text("a".into()).compare(&Value::Int(1)), None);
    }

    #[test]
    fn test_sort_cmp_nulls_first() {
        assert_eq!(Value::Null.sort_cmp(&Value::Int(1)), Ordering::Less);
        assert_eq!(Value::Int(1).sort_cmp(&Value::Null), Ordering::Greater);
        assert_eq!(Value::Null.sort_cmp(&Value::Null), Ordering::Equal);
    }

    #[test]
    fn test_float_equality_and_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(Value::Float(0.0));
        set.insert(Value::Float(-0.0));
        set.insert(Value::Float(1.5));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_serialize() {
        let d = Value::Decimal(Decimal::new(14850, 0));
        assert_eq!(serde_json::to_value(&d).unwrap(), json!(14850));
        let half = Value::Decimal(Decimal::new(25, 1));
        assert_eq!(serde_json::to_value(&half).unwrap(), json!(2.5));
        assert_eq!(serde_json::to_value(Value::Null).unwrap(), json!(null));
    }
}
