//! gridquery - server-side paging, sorting, filtering, grouping and
//! aggregation for grid data sources
//!
//! A `DataSourceRequest` runs through a `QueryPipeline` over any
//! collection of `Record`s and yields a `DataSourceResult`.

pub mod cli;
pub mod config;
pub mod errors;
pub mod executor;
pub mod filter;
pub mod pipeline;
pub mod sample;
pub mod schema;

pub use config::{FieldMatching, FilterMode, QueryConfig};
pub use errors::{QueryError, QueryResult};
pub use pipeline::{DataSourceRequest, DataSourceResult, QueryPipeline, RecordSource};
pub use schema::{Record, Schema, Value};
