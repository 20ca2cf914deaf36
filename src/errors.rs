//! Query error types
//!
//! Error codes:
//! - GRID_UNKNOWN_FIELD
//! - GRID_RECORD_FIELD
//! - GRID_UNSUPPORTED_OPERATOR
//! - GRID_INVALID_OPERATOR
//! - GRID_INVALID_LOGIC
//! - GRID_MALFORMED_FILTER
//! - GRID_TYPE_COERCION
//! - GRID_UNSUPPORTED_AGGREGATE
//! - GRID_AGGREGATE_OVERFLOW
//! - GRID_INVALID_UTC_OFFSET
//!
//! Errors raised while compiling the filter are recoverable: the pipeline
//! records the message and continues unfiltered. Every other error is
//! returned to the caller.

use thiserror::Error;

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Query compilation and execution errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// A path segment does not exist on the record shape
    #[error("Field '{field}' not found on {record}")]
    UnknownField { field: String, record: String },

    /// A path ends on a nested record instead of a value
    #[error("Field '{field}' is a record, not a value")]
    RecordField { field: String },

    /// Operator is not applicable to the field's type
    #[error("Operator {operator} not supported on field '{field}': requires {requirement}")]
    UnsupportedOperator {
        operator: String,
        field: String,
        requirement: &'static str,
    },

    /// Operator outside the fixed vocabulary
    #[error("Unknown filter operator: {0}")]
    InvalidOperator(String),

    /// Branch logic outside {and, or}
    #[error("Invalid filter logic: {0}")]
    InvalidLogic(String),

    /// Node is neither a leaf nor a branch
    #[error("Malformed filter: {0}")]
    MalformedFilter(String),

    /// Comparison value cannot be converted to the field's type
    #[error("Value {value} cannot be converted to {expected} for field '{field}'")]
    TypeCoercion {
        field: String,
        expected: String,
        value: String,
    },

    /// Aggregate kind not applicable to the field's type
    #[error("Aggregate {aggregate} not supported on field '{field}'")]
    UnsupportedAggregate { field: String, aggregate: String },

    /// Integer sum left the i64 range
    #[error("Aggregate sum overflowed on field '{field}'")]
    AggregateOverflow { field: String },

    /// Configured local-time offset outside +/-24h
    #[error("UTC offset of {minutes} minutes is out of range (must be within +/-1439)")]
    InvalidUtcOffset { minutes: i32 },
}

impl QueryError {
    /// Create an unknown field error
    pub fn unknown_field(field: impl Into<String>, record: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
            record: record.into(),
        }
    }

    /// Create a type coercion error
    pub fn type_coercion(
        field: impl Into<String>,
        expected: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::TypeCoercion {
            field: field.into(),
            expected: expected.into(),
            value: value.into(),
        }
    }

    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownField { .. } => "GRID_UNKNOWN_FIELD",
            Self::RecordField { .. } => "GRID_RECORD_FIELD",
            Self::UnsupportedOperator { .. } => "GRID_UNSUPPORTED_OPERATOR",
            Self::InvalidOperator(_) => "GRID_INVALID_OPERATOR",
            Self::InvalidLogic(_) => "GRID_INVALID_LOGIC",
            Self::MalformedFilter(_) => "GRID_MALFORMED_FILTER",
            Self::TypeCoercion { .. } => "GRID_TYPE_COERCION",
            Self::UnsupportedAggregate { .. } => "GRID_UNSUPPORTED_AGGREGATE",
            Self::AggregateOverflow { .. } => "GRID_AGGREGATE_OVERFLOW",
            Self::InvalidUtcOffset { .. } => "GRID_INVALID_UTC_OFFSET",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            QueryError::unknown_field("Foo", "Employee").code(),
            "GRID_UNKNOWN_FIELD"
        );
        assert_eq!(
            QueryError::InvalidLogic("xor".into()).code(),
            "GRID_INVALID_LOGIC"
        );
        assert_eq!(
            QueryError::type_coercion("Number", "int", "\"abc\"").code(),
            "GRID_TYPE_COERCION"
        );
    }

    #[test]
    fn test_error_display() {
        let err = QueryError::UnsupportedOperator {
            operator: "contains".into(),
            field: "Salary".into(),
            requirement: "a text field",
        };
        let display = err.to_string();
        assert!(display.contains("contains"));
        assert!(display.contains("Salary"));
        assert!(display.contains("text"));
    }
}
