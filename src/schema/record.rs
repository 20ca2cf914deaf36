//! Record shapes and field-path resolution
//!
//! Each record type registers a table of named fields with their declared
//! type and an accessor. Nested records are registered with an accessor to
//! the sub-record; paths like `Company.Name` resolve through them.

use std::fmt;
use std::sync::Arc;

use crate::config::FieldMatching;
use crate::errors::{QueryError, QueryResult};

use super::value::{FieldType, Value};

type Getter<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;

/// A type whose fields can be addressed by name
pub trait Record: Sized + 'static {
    /// Returns the field table for this record type
    fn schema() -> Schema<Self>;
}

enum Member<T> {
    Scalar { field_type: FieldType, get: Getter<T> },
    Record(Box<dyn NestedRecord<T>>),
}

struct FieldDef<T> {
    name: &'static str,
    member: Member<T>,
}

/// Field table of a record type
pub struct Schema<T> {
    name: &'static str,
    fields: Vec<FieldDef<T>>,
}

impl<T: 'static> Schema<T> {
    /// Creates an empty schema
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// Registers a scalar field
    pub fn field<F>(mut self, name: &'static str, field_type: FieldType, get: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        self.fields.push(FieldDef {
            name,
            member: Member::Scalar {
                field_type,
                get: Arc::new(get),
            },
        });
        self
    }

    /// Registers an optional nested record
    pub fn record<U: Record>(mut self, name: &'static str, get: fn(&T) -> Option<&U>) -> Self {
        self.fields.push(FieldDef {
            name,
            member: Member::Record(Box::new(Nested { get })),
        });
        self
    }

    /// Returns the record type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the declared field names in registration order
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Resolves a dotted field path to an accessor.
    ///
    /// Segments are matched left to right against declared names; the
    /// accessor reports the declared spelling of the path.
    pub fn resolve(&self, path: &str, matching: FieldMatching) -> QueryResult<FieldAccessor<T>> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(QueryError::unknown_field(path, self.name));
        }
        self.resolve_segments(path, &segments, matching)
    }

    fn resolve_segments(
        &self,
        full_path: &str,
        segments: &[&str],
        matching: FieldMatching,
    ) -> QueryResult<FieldAccessor<T>> {
        let (head, rest) = segments
            .split_first()
            .ok_or_else(|| QueryError::unknown_field(full_path, self.name))?;

        let def = self
            .fields
            .iter()
            .find(|f| matching.matches(f.name, head))
            .ok_or_else(|| QueryError::unknown_field(full_path, self.name))?;

        match &def.member {
            Member::Scalar { field_type, get } if rest.is_empty() => Ok(FieldAccessor {
                path: def.name.to_string(),
                field_type: *field_type,
                get: Arc::clone(get),
            }),
            Member::Scalar { .. } => Err(QueryError::unknown_field(full_path, self.name)),
            Member::Record(_) if rest.is_empty() => Err(QueryError::RecordField {
                field: full_path.to_string(),
            }),
            Member::Record(nested) => nested.resolve(def.name, full_path, rest, matching),
        }
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field(
                "fields",
                &self.fields.iter().map(|d| d.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

trait NestedRecord<T>: Send + Sync {
    fn resolve(
        &self,
        name: &str,
        full_path: &str,
        rest: &[&str],
        matching: FieldMatching,
    ) -> QueryResult<FieldAccessor<T>>;
}

struct Nested<T, U> {
    get: fn(&T) -> Option<&U>,
}

impl<T: 'static, U: Record> NestedRecord<T> for Nested<T, U> {
    fn resolve(
        &self,
        name: &str,
        full_path: &str,
        rest: &[&str],
        matching: FieldMatching,
    ) -> QueryResult<FieldAccessor<T>> {
        let inner = U::schema().resolve_segments(full_path, rest, matching)?;
        let get = self.get;
        let inner_get = inner.get;

        // The sub-record may be absent, so everything below it is nullable
        Ok(FieldAccessor {
            path: format!("{}.{}", name, inner.path),
            field_type: inner.field_type.into_nullable(),
            get: Arc::new(move |record: &T| match get(record) {
                Some(child) => inner_get(child),
                None => Value::Null,
            }),
        })
    }
}

/// Resolved field path: declared type plus a value accessor
pub struct FieldAccessor<T> {
    path: String,
    field_type: FieldType,
    get: Getter<T>,
}

impl<T> FieldAccessor<T> {
    /// Declared spelling of the path
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Reads the field from a record
    pub fn get(&self, record: &T) -> Value {
        (self.get)(record)
    }
}

impl<T> Clone for FieldAccessor<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            field_type: self.field_type,
            get: Arc::clone(&self.get),
        }
    }
}

impl<T> fmt::Debug for FieldAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("path", &self.path)
            .field("field_type", &self.field_type)
            .finish()
    }
}
