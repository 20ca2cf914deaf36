//! Result envelope

use serde::Serialize;

use crate::executor::{Aggregates, GroupResult};

/// Paged records or group tree, plus overall metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSourceResult<T> {
    /// Paged records; None when grouped
    pub data: Option<Vec<T>>,
    /// Group tree over the paged records; None when not grouped
    pub groups: Option<Vec<GroupResult<T>>>,
    /// Overall aggregates over every filtered record
    pub aggregates: Option<Aggregates>,
    /// Filtered count before paging
    pub total: usize,
    /// Non-fatal error messages
    pub errors: Option<Vec<String>>,
}

impl<T> DataSourceResult<T> {
    pub fn is_grouped(&self) -> bool {
        self.groups.is_some()
    }

    /// Paged records, or an empty slice when grouped
    pub fn records(&self) -> &[T] {
        self.data.as_deref().unwrap_or(&[])
    }

    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().map_or(false, |e| !e.is_empty())
    }
}
