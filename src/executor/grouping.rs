//! Recursive grouping
//!
//! Each level partitions its input by one field's value, in first-seen
//! order, and computes that level's aggregates per partition. The last
//! level keeps the raw records.

use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::config::FieldMatching;
use crate::errors::QueryResult;
use crate::schema::{FieldAccessor, Record, Value};

use super::aggregator::{AggregateKind, AggregateRequest, Aggregates, Aggregator};
use super::sorter::{SortDirection, SortKey};

/// One group-by level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub field: String,

    /// Direction of the sort key injected for this level
    #[serde(default)]
    pub dir: SortDirection,

    #[serde(default)]
    pub aggregates: Vec<AggregateRequest>,

    /// Nested levels, applied after this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group: Vec<GroupSpec>,
}

impl GroupSpec {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            dir: SortDirection::Asc,
            aggregates: Vec::new(),
            group: Vec::new(),
        }
    }

    pub fn with_dir(mut self, dir: SortDirection) -> Self {
        self.dir = dir;
        self
    }

    pub fn with_aggregate(mut self, field: impl Into<String>, kind: AggregateKind) -> Self {
        self.aggregates.push(AggregateRequest::new(field, kind));
        self
    }

    pub fn with_subgroup(mut self, spec: GroupSpec) -> Self {
        self.group.push(spec);
        self
    }

    /// Depth-first flattening: each spec precedes its nested specs
    pub fn flatten(specs: &[GroupSpec]) -> Vec<GroupSpec> {
        let mut out = Vec::new();
        for spec in specs {
            out.push(GroupSpec {
                group: Vec::new(),
                ..spec.clone()
            });
            out.extend(Self::flatten(&spec.group));
        }
        out
    }

    /// Sort key implied by this level
    pub fn sort_key(&self) -> SortKey {
        SortKey {
            field: self.field.clone(),
            dir: self.dir,
        }
    }
}

/// Items below a group: raw records at the last level, subgroups otherwise
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GroupItems<T> {
    Records(Vec<T>),
    Groups(Vec<GroupResult<T>>),
}

impl<T> GroupItems<T> {
    pub fn len(&self) -> usize {
        match self {
            GroupItems::Records(records) => records.len(),
            GroupItems::Groups(groups) => groups.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupResult<T> {
    /// Group key
    pub value: Value,
    /// Grouping field name as requested
    pub field: String,
    /// Number of records in the group
    pub count: usize,
    pub aggregates: Option<Aggregates>,
    pub has_subgroups: bool,
    pub items: GroupItems<T>,
}

impl<T> GroupResult<T> {
    /// `"<field> (<count>)"`
    pub fn label(&self) -> String {
        format!("{} ({})", self.field, self.count)
    }
}

impl<T: Serialize> Serialize for GroupResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("GroupResult", 5)?;
        state.serialize_field("value", &self.value)?;
        state.serialize_field("field", &self.label())?;
        state.serialize_field("aggregates", &self.aggregates)?;
        state.serialize_field("items", &self.items)?;
        state.serialize_field("hasSubgroups", &self.has_subgroups)?;
        state.end()
    }
}

struct GroupLevel<T> {
    field: String,
    accessor: FieldAccessor<T>,
    aggregator: Aggregator<T>,
}

/// Groups records by a flattened list of group specs
pub struct GroupingEngine<T> {
    levels: Vec<GroupLevel<T>>,
}

impl<T: Record> GroupingEngine<T> {
    /// Flattens and resolves the specs
    pub fn compile(specs: &[GroupSpec], matching: FieldMatching) -> QueryResult<Self> {
        let schema = T::schema();
        let levels = GroupSpec::flatten(specs)
            .into_iter()
            .map(|spec| {
                Ok(GroupLevel {
                    accessor: schema.resolve(&spec.field, matching)?,
                    aggregator: Aggregator::compile(&spec.aggregates, matching)?,
                    field: spec.field,
                })
            })
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(Self { levels })
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn group(&self, records: Vec<T>) -> QueryResult<Vec<GroupResult<T>>> {
        self.group_level(0, records)
    }

    fn group_level(&self, depth: usize, records: Vec<T>) -> QueryResult<Vec<GroupResult<T>>> {
        let level = match self.levels.get(depth) {
            Some(level) => level,
            None => return Ok(Vec::new()),
        };
        let has_subgroups = depth + 1 < self.levels.len();

        let mut partitions: IndexMap<Value, Vec<T>> = IndexMap::new();
        for record in records {
            partitions
                .entry(level.accessor.get(&record))
                .or_default()
                .push(record);
        }

        partitions
            .into_iter()
            .map(|(value, members)| {
                let aggregates = level.aggregator.compute(&members)?;
                let count = members.len();
                let items = if has_subgroups {
                    GroupItems::Groups(self.group_level(depth + 1, members)?)
                } else {
                    GroupItems::Records(members)
                };
                Ok(GroupResult {
                    value,
                    field: level.field.clone(),
                    count,
                    aggregates,
                    has_subgroups,
                    items,
                })
            })
            .collect()
    }
}
