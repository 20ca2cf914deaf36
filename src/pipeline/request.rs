//! Request descriptor

use serde::{Deserialize, Deserializer, Serialize};

use crate::executor::{AggregateKind, AggregateRequest, GroupSpec, SortKey};
use crate::filter::FilterDescriptor;

/// A grid query: paging, sorting, filtering, aggregation and grouping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSourceRequest {
    /// Page size; `<= 0` returns every record
    pub take: i64,
    pub skip: i64,

    #[serde(deserialize_with = "null_as_empty")]
    pub sort: Vec<SortKey>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterDescriptor>,

    #[serde(deserialize_with = "null_as_empty")]
    pub aggregate: Vec<AggregateRequest>,

    #[serde(deserialize_with = "null_as_empty")]
    pub group: Vec<GroupSpec>,
}

impl DataSourceRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, skip: i64, take: i64) -> Self {
        self.skip = skip;
        self.take = take;
        self
    }

    pub fn with_sort(mut self, key: SortKey) -> Self {
        self.sort.push(key);
        self
    }

    pub fn with_filter(mut self, filter: FilterDescriptor) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_aggregate(mut self, field: impl Into<String>, kind: AggregateKind) -> Self {
        self.aggregate.push(AggregateRequest::new(field, kind));
        self
    }

    pub fn with_group(mut self, spec: GroupSpec) -> Self {
        self.group.push(spec);
        self
    }

    /// Group keys in nesting order, then the explicit sort keys
    pub fn effective_sort(&self) -> Vec<SortKey> {
        GroupSpec::flatten(&self.group)
            .iter()
            .map(GroupSpec::sort_key)
            .chain(self.sort.iter().cloned())
            .collect()
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::SortDirection;
    use serde_json::json;

    #[test]
    fn test_deserialize_full_request() {
        let request: DataSourceRequest = serde_json::from_value(json!({
            "take": 20,
            "skip": 0,
            "sort": [{"field": "Number", "dir": "desc"}],
            "filter": {
                "logic": "and",
                "filters": [{"field": "Salary", "operator": "gt", "value": 999}]
            },
            "aggregate": [{"field": "Salary", "aggregate": "sum"}],
            "group": [{
                "field": "Gender",
                "aggregates": [{"field": "Salary", "aggregate": "count"}]
            }]
        }))
        .unwrap();

        assert_eq!(request.take, 20);
        assert_eq!(request.sort, vec![SortKey::desc("Number")]);
        assert!(request.filter.is_some());
        assert_eq!(request.aggregate.len(), 1);
        assert_eq!(request.group[0].aggregates.len(), 1);
    }

    #[test]
    fn test_missing_and_null_members() {
        let request: DataSourceRequest =
            serde_json::from_value(json!({"take": 0, "sort": null, "filter": null})).unwrap();

        assert_eq!(request, DataSourceRequest::default());
    }

    #[test]
    fn test_effective_sort_puts_group_keys_first() {
        let request = DataSourceRequest::new()
            .with_sort(SortKey::desc("Salary"))
            .with_group(
                GroupSpec::new("Company.Name")
                    .with_subgroup(GroupSpec::new("Gender").with_dir(SortDirection::Desc)),
            );

        assert_eq!(
            request.effective_sort(),
            vec![
                SortKey::asc("Company.Name"),
                SortKey::desc("Gender"),
                SortKey::desc("Salary"),
            ]
        );
    }

    #[test]
    fn test_effective_sort_without_groups() {
        let request = DataSourceRequest::new().with_sort(SortKey::asc("Name"));
        assert_eq!(request.effective_sort(), vec![SortKey::asc("Name")]);
    }
}
