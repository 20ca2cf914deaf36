//! Record sorting
//!
//! Multi-key, stable, deterministic. Keys are read once per record before
//! sorting.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::config::FieldMatching;
use crate::errors::QueryResult;
use crate::schema::{FieldAccessor, Record, Value};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// A (field, direction) pair; earlier keys take precedence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    #[serde(default)]
    pub dir: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            dir: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            dir: SortDirection::Desc,
        }
    }
}

/// Sorts records by a compiled list of sort keys
pub struct RecordSorter<T> {
    keys: Vec<(FieldAccessor<T>, SortDirection)>,
}

impl<T: Record> RecordSorter<T> {
    /// Resolves every key against the record schema
    pub fn compile(keys: &[SortKey], matching: FieldMatching) -> QueryResult<Self> {
        let schema = T::schema();
        let keys = keys
            .iter()
            .map(|key| Ok((schema.resolve(&key.field, matching)?, key.dir)))
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(Self { keys })
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Sorts records. With no keys the input order is kept.
    ///
    /// Ordering rules:
    /// - nulls before any value (after, when descending)
    /// - numbers, text and date-times in natural order
    /// - ties keep arrival order
    pub fn sort(&self, records: Vec<T>) -> Vec<T> {
        if self.keys.is_empty() {
            return records;
        }

        let mut decorated: Vec<(Vec<Value>, T)> = records
            .into_iter()
            .map(|record| {
                let values = self.keys.iter().map(|(a, _)| a.get(&record)).collect();
                (values, record)
            })
            .collect();

        decorated.sort_by(|(a, _), (b, _)| self.compare(a, b));
        decorated.into_iter().map(|(_, record)| record).collect()
    }

    fn compare(&self, a: &[Value], b: &[Value]) -> Ordering {
        for ((av, bv), (_, dir)) in a.iter().zip(b).zip(&self.keys) {
            let ordering = match dir {
                SortDirection::Asc => av.sort_cmp(bv),
                SortDirection::Desc => av.sort_cmp(bv).reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::QueryError;
    use crate::sample::{employees, Employee};

    fn sorted_names(keys: &[SortKey]) -> Vec<String> {
        RecordSorter::<Employee>::compile(keys, FieldMatching::Exact)
            .unwrap()
            .sort(employees())
            .into_iter()
            .map(|e| e.name)
            .collect()
    }

    #[test]
    fn test_sort_ascending() {
        assert_eq!(
            sorted_names(&[SortKey::asc("Salary")]),
            vec!["Monie", "Rock", "CoCo", "Kirin", "Pikachu"]
        );
    }

    #[test]
    fn test_sort_descending() {
        assert_eq!(
            sorted_names(&[SortKey::desc("Birthday")]),
            vec!["Pikachu", "Monie", "CoCo", "Kirin", "Rock"]
        );
    }

    #[test]
    fn test_sort_stable() {
        // Same company, arrival order preserved within it
        assert_eq!(
            sorted_names(&[SortKey::asc("Company.Name")]),
            vec!["Rock", "Pikachu", "Kirin", "Monie", "CoCo"]
        );
    }

    #[test]
    fn test_secondary_key_breaks_ties() {
        assert_eq!(
            sorted_names(&[SortKey::asc("Gender"), SortKey::desc("Salary")]),
            vec!["CoCo", "Monie", "Kirin", "Rock", "Pikachu"]
        );
    }

    #[test]
    fn test_nulls_first() {
        let names = sorted_names(&[SortKey::asc("Introduce")]);
        assert_eq!(names[0], "Kirin");

        let names = sorted_names(&[SortKey::desc("Introduce")]);
        assert_eq!(names[4], "Kirin");
    }

    #[test]
    fn test_no_keys_keeps_order() {
        assert_eq!(
            sorted_names(&[]),
            vec!["Monie", "CoCo", "Kirin", "Rock", "Pikachu"]
        );
    }

    #[test]
    fn test_unknown_sort_field() {
        let err = RecordSorter::<Employee>::compile(&[SortKey::asc("Age")], FieldMatching::Exact)
            .err()
            .unwrap();
        assert!(matches!(err, QueryError::UnknownField { .. }));
    }

    #[test]
    fn test_direction_wire_format() {
        let key: SortKey = serde_json::from_str(r#"{"field": "Name", "dir": "desc"}"#).unwrap();
        assert_eq!(key, SortKey::desc("Name"));

        let key: SortKey = serde_json::from_str(r#"{"field": "Name"}"#).unwrap();
        assert_eq!(key.dir, SortDirection::Asc);
    }
}
