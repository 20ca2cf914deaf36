//! Record sources
//!
//! A source hands the pipeline its records, optionally applying the
//! compiled filter itself. Remote sources may push the filter's
//! `QueryExpression` down instead of evaluating the predicate.

use crate::errors::QueryResult;
use crate::filter::CompiledFilter;

/// Supplies records for one pipeline run
pub trait RecordSource<T> {
    /// Returns the records matching `filter`, or every record when None
    fn fetch(&self, filter: Option<&CompiledFilter<T>>) -> QueryResult<Vec<T>>;
}

impl<T: Clone> RecordSource<T> for [T] {
    fn fetch(&self, filter: Option<&CompiledFilter<T>>) -> QueryResult<Vec<T>> {
        Ok(match filter {
            Some(filter) => self.iter().filter(|r| filter.matches(r)).cloned().collect(),
            None => self.to_vec(),
        })
    }
}

impl<T: Clone> RecordSource<T> for Vec<T> {
    fn fetch(&self, filter: Option<&CompiledFilter<T>>) -> QueryResult<Vec<T>> {
        self.as_slice().fetch(filter)
    }
}
