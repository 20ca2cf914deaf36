//! Query configuration
//!
//! Selects the filter execution mode, the field-name matching policy and
//! the time zone used to interpret date-time filter values.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::{QueryError, QueryResult};

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(#[from] QueryError),
}

/// How string-only operators treat non-string fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// In-memory predicate: string operators require a text field
    #[default]
    Predicate,
    /// Query-expression form: non-string fields are stringified behind a
    /// null check for the substring operators
    Expression,
}

/// How field path segments are matched against declared names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldMatching {
    #[default]
    Exact,
    IgnoreCase,
}

impl FieldMatching {
    /// Returns true if `declared` matches the requested segment
    pub fn matches(&self, declared: &str, requested: &str) -> bool {
        match self {
            FieldMatching::Exact => declared == requested,
            FieldMatching::IgnoreCase => declared.eq_ignore_ascii_case(requested),
        }
    }
}

/// Query configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Filter execution mode (default: predicate)
    #[serde(default)]
    pub filter_mode: FilterMode,

    /// Field path matching (default: exact)
    #[serde(default)]
    pub field_matching: FieldMatching,

    /// Offset of "local time" from UTC in minutes (default: host time zone)
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

impl QueryConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let config: QueryConfig = serde_json::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Checks that the configured offset is a valid UTC offset
    pub fn validate(&self) -> QueryResult<()> {
        self.local_offset().map(|_| ())
    }

    pub fn with_filter_mode(mut self, mode: FilterMode) -> Self {
        self.filter_mode = mode;
        self
    }

    pub fn with_field_matching(mut self, matching: FieldMatching) -> Self {
        self.field_matching = matching;
        self
    }

    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = Some(minutes);
        self
    }

    /// Configured offset, or None for the host time zone
    pub fn local_offset(&self) -> QueryResult<Option<FixedOffset>> {
        match self.utc_offset_minutes {
            None => Ok(None),
            Some(minutes) => minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .map(Some)
                .ok_or(QueryError::InvalidUtcOffset { minutes }),
        }
    }

    /// Converts an instant to wall-clock time in the configured zone
    pub fn to_local(&self, instant: &DateTime<FixedOffset>) -> QueryResult<NaiveDateTime> {
        Ok(match self.local_offset()? {
            Some(offset) => instant.with_timezone(&offset).naive_local(),
            None => instant.with_timezone(&Local).naive_local(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_defaults() {
        let config = QueryConfig::default();
        assert_eq!(config.filter_mode, FilterMode::Predicate);
        assert_eq!(config.field_matching, FieldMatching::Exact);
        assert!(config.utc_offset_minutes.is_none());
    }

    #[test]
    fn test_config_load_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"filter_mode": "expression", "utc_offset_minutes": 480}}"#).unwrap();

        let config = QueryConfig::load(file.path()).unwrap();
        assert_eq!(config.filter_mode, FilterMode::Expression);
        assert_eq!(config.field_matching, FieldMatching::Exact);
        assert_eq!(config.utc_offset_minutes, Some(480));
    }

    #[test]
    fn test_config_load_rejects_unknown_mode() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"filter_mode": "sql"}}"#).unwrap();

        assert!(QueryConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_field_matching() {
        assert!(FieldMatching::Exact.matches("Name", "Name"));
        assert!(!FieldMatching::Exact.matches("Name", "name"));
        assert!(FieldMatching::IgnoreCase.matches("Name", "nAME"));
    }

    #[test]
    fn test_to_local_fixed_offset() {
        let config = QueryConfig::default().with_utc_offset_minutes(8 * 60);
        let instant = DateTime::parse_from_rfc3339("1986-10-09T16:00:00Z").unwrap();
        let local = config.to_local(&instant).unwrap();
        assert_eq!(local.to_string(), "1986-10-10 00:00:00");
    }

    #[test]
    fn test_to_local_rejects_out_of_range_offset() {
        let instant = DateTime::parse_from_rfc3339("1986-10-09T16:00:00Z").unwrap();

        for minutes in [1440, -1440, 100_000, 40_000_000, i32::MIN] {
            let config = QueryConfig::default().with_utc_offset_minutes(minutes);
            assert_eq!(
                config.to_local(&instant),
                Err(QueryError::InvalidUtcOffset { minutes })
            );
            assert!(config.validate().is_err());
        }

        let edge = QueryConfig::default().with_utc_offset_minutes(-1439);
        assert!(edge.to_local(&instant).is_ok());
    }

    #[test]
    fn test_config_load_rejects_out_of_range_offset() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"utc_offset_minutes": 40000000}}"#).unwrap();

        match QueryConfig::load(file.path()) {
            Err(ConfigError::Invalid(QueryError::InvalidUtcOffset { minutes })) => {
                assert_eq!(minutes, 40_000_000)
            }
            other => panic!("expected offset error, got {:?}", other),
        }
    }

    #[test]
    fn test_config_load_missing_file() {
        let err = QueryConfig::load(Path::new("/nonexistent/grid.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/grid.json"));
    }
}
