//! Query pipeline
//!
//! Filter → Count → Aggregate → Sort → Page → Group, in that order.

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::QueryConfig;
use crate::errors::QueryResult;
use crate::executor::{Aggregator, GroupingEngine, Page, RecordSorter, SortKey};
use crate::filter::{CompiledFilter, FilterCompiler, QueryExpression};
use crate::schema::Record;

use super::events::PipelineEvent;
use super::request::DataSourceRequest;
use super::result::DataSourceResult;
use super::source::RecordSource;

/// What a request compiles to, without running it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    /// Normalized filter expression; None when unfiltered
    pub expression: Option<QueryExpression>,
    /// Filter compilation error, if the filter would be skipped
    pub filter_error: Option<String>,
    /// Effective sort keys, group keys first
    pub sort: Vec<SortKey>,
}

/// Runs data source requests against record collections
#[derive(Debug, Clone, Default)]
pub struct QueryPipeline {
    config: QueryConfig,
}

impl QueryPipeline {
    pub fn new(config: QueryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Runs `request` over `records`. The input is materialized once.
    ///
    /// A filter that fails to compile is skipped and its message recorded
    /// in `errors`; sort, aggregate and group errors are returned.
    pub fn execute<T, I>(
        &self,
        records: I,
        request: &DataSourceRequest,
    ) -> QueryResult<DataSourceResult<T>>
    where
        T: Record,
        I: IntoIterator<Item = T>,
    {
        let mut errors = Vec::new();
        let filter = self.compile_filter::<T>(request, &mut errors);

        let records: Vec<T> = match &filter {
            Some(filter) => records.into_iter().filter(|r| filter.matches(r)).collect(),
            None => records.into_iter().collect(),
        };

        self.shape(records, request, errors)
    }

    /// Runs `request` over a record source, handing it the compiled filter
    pub fn execute_source<T, S>(
        &self,
        source: &S,
        request: &DataSourceRequest,
    ) -> QueryResult<DataSourceResult<T>>
    where
        T: Record,
        S: RecordSource<T> + ?Sized,
    {
        let mut errors = Vec::new();
        let filter = self.compile_filter::<T>(request, &mut errors);
        let records = source.fetch(filter.as_ref())?;

        self.shape(records, request, errors)
    }

    /// Compiles the filter and sort of `request` for record type `T`
    pub fn explain<T: Record>(&self, request: &DataSourceRequest) -> Explanation {
        let mut errors = Vec::new();
        let filter = self.compile_filter::<T>(request, &mut errors);

        Explanation {
            expression: filter.map(|f| f.expression().clone()),
            filter_error: errors.into_iter().next(),
            sort: request.effective_sort(),
        }
    }

    fn compile_filter<T: Record>(
        &self,
        request: &DataSourceRequest,
        errors: &mut Vec<String>,
    ) -> Option<CompiledFilter<T>> {
        let descriptor = request.filter.as_ref()?;

        match FilterCompiler::new(&self.config).compile_descriptor::<T>(descriptor) {
            Ok(Some(filter)) => {
                debug!(
                    event = PipelineEvent::FilterApplied.as_str(),
                    expression = %filter.expression(),
                    params = filter.expression().params.len(),
                );
                Some(filter)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(
                    event = PipelineEvent::FilterDegraded.as_str(),
                    code = err.code(),
                    error = %err,
                    "filter skipped"
                );
                errors.push(err.to_string());
                None
            }
        }
    }

    fn shape<T: Record>(
        &self,
        records: Vec<T>,
        request: &DataSourceRequest,
        errors: Vec<String>,
    ) -> QueryResult<DataSourceResult<T>> {
        let matching = self.config.field_matching;

        let total = records.len();
        debug!(event = PipelineEvent::TotalCounted.as_str(), total);

        let aggregator = Aggregator::compile(&request.aggregate, matching)?;
        let aggregates = aggregator.compute(&records)?;
        if !aggregator.is_empty() {
            debug!(
                event = PipelineEvent::AggregatesComputed.as_str(),
                requests = request.aggregate.len(),
            );
        }

        let grouping = GroupingEngine::compile(&request.group, matching)?;
        let sort_keys = request.effective_sort();
        let sorter = RecordSorter::compile(&sort_keys, matching)?;
        debug!(
            event = PipelineEvent::SortAssembled.as_str(),
            keys = sort_keys.len(),
            group_keys = grouping.depth(),
        );
        let records = sorter.sort(records);

        let page = Page::new(request.skip, request.take);
        let records = page.apply(records);
        if page.is_enabled() {
            debug!(
                event = PipelineEvent::PageApplied.as_str(),
                skip = request.skip,
                take = request.take,
                returned = records.len(),
            );
        }

        let (data, groups) = if grouping.depth() > 0 {
            let groups = grouping.group(records)?;
            debug!(event = PipelineEvent::GroupsBuilt.as_str(), groups = groups.len());
            (None, Some(groups))
        } else {
            (Some(records), None)
        };

        Ok(DataSourceResult {
            data,
            groups,
            aggregates,
            total,
            errors: if errors.is_empty() { None } else { Some(errors) },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{AggregateKind, GroupSpec};
    use crate::filter::FilterDescriptor;
    use crate::sample::{employees, Employee};
    use serde_json::json;

    fn run(request: &DataSourceRequest) -> DataSourceResult<Employee> {
        QueryPipeline::default().execute(employees(), request).unwrap()
    }

    #[test]
    fn test_empty_request_passes_through() {
        let result = run(&DataSourceRequest::new());

        assert_eq!(result.total, 5);
        assert_eq!(result.records().len(), 5);
        assert!(result.aggregates.is_none());
        assert!(result.groups.is_none());
        assert!(result.errors.is_none());
    }

    #[test]
    fn test_bad_filter_degrades() {
        let request = DataSourceRequest::new()
            .with_filter(FilterDescriptor::leaf("Number", "startswith", json!("1")));
        let result = run(&request);

        assert_eq!(result.total, 5);
        assert!(result.has_errors());
        assert_eq!(result.errors.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_bad_aggregate_is_terminal() {
        let request = DataSourceRequest::new().with_aggregate("Name", AggregateKind::Average);
        let err = QueryPipeline::default()
            .execute(employees(), &request)
            .err()
            .unwrap();

        assert_eq!(err.code(), "GRID_UNSUPPORTED_AGGREGATE");
    }

    #[test]
    fn test_bad_group_is_terminal() {
        let request = DataSourceRequest::new().with_group(GroupSpec::new("Department"));
        assert!(QueryPipeline::default().execute(employees(), &request).is_err());
    }

    #[test]
    fn test_page_then_group() {
        let request = DataSourceRequest::new()
            .with_page(0, 2)
            .with_group(GroupSpec::new("Gender"));
        let result = run(&request);

        // First two after sorting by Gender are both Female
        let groups = result.groups.unwrap();
        assert_eq!(result.total, 5);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 2);
        assert!(result.data.is_none());
    }

    #[test]
    fn test_execute_source_matches_execute() {
        let request = DataSourceRequest::new()
            .with_filter(FilterDescriptor::leaf("Company.Name", "eq", json!("Apple")))
            .with_sort(SortKey::desc("Number"));
        let pipeline = QueryPipeline::default();

        let from_source = pipeline.execute_source(&employees(), &request).unwrap();
        let from_iter = pipeline.execute(employees(), &request).unwrap();
        assert_eq!(from_source, from_iter);
        assert_eq!(from_source.total, 2);
    }

    #[test]
    fn test_explain() {
        let request = DataSourceRequest::new()
            .with_filter(FilterDescriptor::leaf("Salary", "gte", json!(2500)))
            .with_group(GroupSpec::new("Gender"));
        let explanation = QueryPipeline::default().explain::<Employee>(&request);

        assert_eq!(
            explanation.expression.map(|e| e.text),
            Some("Salary >= @0".to_string())
        );
        assert!(explanation.filter_error.is_none());
        assert_eq!(explanation.sort, vec![SortKey::asc("Gender")]);
    }
}
