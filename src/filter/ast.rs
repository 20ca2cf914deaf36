//! # Filter Expression AST
//!
//! Wire descriptors as sent by grid clients, and the typed filter tree
//! they are parsed into.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{QueryError, QueryResult};
use crate::schema::Value;

/// Filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    StartsWith,
    EndsWith,
    Contains,
    DoesNotContain,
    IsNull,
    IsNotNull,
    IsEmpty,
    IsNotEmpty,
    IsNullOrEmpty,
    IsNotNullOrEmpty,
}

impl Operator {
    /// Get the operator string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::StartsWith => "startswith",
            Operator::EndsWith => "endswith",
            Operator::Contains => "contains",
            Operator::DoesNotContain => "doesnotcontain",
            Operator::IsNull => "isnull",
            Operator::IsNotNull => "isnotnull",
            Operator::IsEmpty => "isempty",
            Operator::IsNotEmpty => "isnotempty",
            Operator::IsNullOrEmpty => "isnullorempty",
            Operator::IsNotNullOrEmpty => "isnotnullorempty",
        }
    }

    /// Operators defined only for text fields
    pub fn is_string_only(&self) -> bool {
        self.is_substring() || self.is_emptiness()
    }

    /// startswith, endswith, contains, doesnotcontain
    pub fn is_substring(&self) -> bool {
        matches!(
            self,
            Operator::StartsWith
                | Operator::EndsWith
                | Operator::Contains
                | Operator::DoesNotContain
        )
    }

    /// isempty, isnotempty, isnullorempty, isnotnullorempty
    pub fn is_emptiness(&self) -> bool {
        matches!(
            self,
            Operator::IsEmpty
                | Operator::IsNotEmpty
                | Operator::IsNullOrEmpty
                | Operator::IsNotNullOrEmpty
        )
    }

    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte
        )
    }
}

impl FromStr for Operator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s {
            "eq" => Operator::Eq,
            "neq" => Operator::Neq,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "startswith" => Operator::StartsWith,
            "endswith" => Operator::EndsWith,
            "contains" => Operator::Contains,
            "doesnotcontain" => Operator::DoesNotContain,
            "isnull" => Operator::IsNull,
            "isnotnull" => Operator::IsNotNull,
            "isempty" => Operator::IsEmpty,
            "isnotempty" => Operator::IsNotEmpty,
            "isnullorempty" => Operator::IsNullOrEmpty,
            "isnotnullorempty" => Operator::IsNotNullOrEmpty,
            other => return Err(QueryError::InvalidOperator(other.to_string())),
        };
        Ok(op)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Branch combinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Logic {
    And,
    Or,
}

impl Logic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Logic::And => "and",
            Logic::Or => "or",
        }
    }
}

impl FromStr for Logic {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "and" => Ok(Logic::And),
            "or" => Ok(Logic::Or),
            other => Err(QueryError::InvalidLogic(other.to_string())),
        }
    }
}

/// A filter descriptor as it appears on the wire.
///
/// Leaf: `{field, operator, value, ignoreCase?}`.
/// Branch: `{logic, filters}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,

    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub value: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<FilterDescriptor>>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ignore_case: bool,
}

impl FilterDescriptor {
    /// Create a leaf descriptor
    pub fn leaf(
        field: impl Into<String>,
        operator: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        Self {
            field: Some(field.into()),
            operator: Some(operator.into()),
            value,
            ..Default::default()
        }
    }

    /// Create a branch descriptor
    pub fn branch(logic: impl Into<String>, filters: Vec<FilterDescriptor>) -> Self {
        Self {
            logic: Some(logic.into()),
            filters: Some(filters),
            ..Default::default()
        }
    }

    pub fn with_ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    /// True when the descriptor carries neither a field nor child filters
    pub fn is_empty(&self) -> bool {
        self.field.is_none() && self.filters.as_ref().map_or(true, |f| f.is_empty())
    }

    /// Parses the descriptor into a typed filter tree
    pub fn to_node(&self) -> QueryResult<FilterNode> {
        if let Some(children) = &self.filters {
            if !children.is_empty() || self.field.is_none() {
                let logic = match &self.logic {
                    Some(l) => l.parse()?,
                    None => return Err(QueryError::InvalidLogic("(none)".to_string())),
                };
                let children = children
                    .iter()
                    .map(FilterDescriptor::to_node)
                    .collect::<QueryResult<Vec<_>>>()?;
                return Ok(FilterNode::Branch { logic, children });
            }
        }

        let field = self.field.as_ref().ok_or_else(|| {
            QueryError::MalformedFilter("filter has neither a field nor child filters".into())
        })?;
        let operator: Operator = self
            .operator
            .as_deref()
            .ok_or_else(|| {
                QueryError::MalformedFilter(format!("filter on '{}' has no operator", field))
            })?
            .parse()?;
        let value = Value::from_json(&self.value)
            .ok_or_else(|| QueryError::type_coercion(field, "a scalar", self.value.to_string()))?;

        Ok(FilterNode::Leaf(Condition {
            field: field.clone(),
            operator,
            value,
            ignore_case: self.ignore_case,
        }))
    }
}

/// A single comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
    pub ignore_case: bool,
}

/// Typed filter tree
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Leaf(Condition),
    Branch {
        logic: Logic,
        children: Vec<FilterNode>,
    },
}

impl FilterNode {
    /// Create a leaf node
    pub fn leaf(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        FilterNode::Leaf(Condition {
            field: field.into(),
            operator,
            value: value.into(),
            ignore_case: false,
        })
    }

    pub fn and(children: Vec<FilterNode>) -> Self {
        FilterNode::Branch {
            logic: Logic::And,
            children,
        }
    }

    pub fn or(children: Vec<FilterNode>) -> Self {
        FilterNode::Branch {
            logic: Logic::Or,
            children,
        }
    }

    /// Flattened list of leaf conditions, left to right
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a Condition>) {
        match self {
            FilterNode::Leaf(c) => out.push(c),
            FilterNode::Branch { children, .. } => {
                for child in children {
                    child.collect(out);
                }
            }
        }
    }
}
