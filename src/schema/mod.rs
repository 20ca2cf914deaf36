//! Record schema subsystem
//!
//! Replaces runtime reflection with a registration-time field table per
//! record type: `field name -> (declared type, accessor)`.
//!
//! # Resolution
//!
//! A dotted path (`Company.Name`) is resolved segment by segment. Each
//! segment must name a field on the current record; intermediate segments
//! must be nested records and the last one a scalar. Matching is exact or
//! case-insensitive per `FieldMatching`, applied the same way for filter,
//! sort, aggregate and group paths.

mod record;
mod value;

pub use record::{FieldAccessor, Record, Schema};
pub use value::{FieldType, Value, ValueType};
