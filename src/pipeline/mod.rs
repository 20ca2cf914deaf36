//! # Pipeline Subsystem
//!
//! Entry point for running a `DataSourceRequest`.
//!
//! # Stage Order (strict)
//!
//! 1. Filter: compile and apply; a compile failure skips filtering and is
//!    recorded in `errors`
//! 2. Count the filtered records (`total`)
//! 3. Aggregate over the filtered records
//! 4. Sort by group keys first, then explicit keys
//! 5. Page (`take > 0` only)
//! 6. Group the paged records, or return them flat
//!
//! Records are materialized once; every stage works on the owned `Vec`.

mod events;
mod pipeline;
mod request;
mod result;
mod source;

pub use events::PipelineEvent;
pub use pipeline::{Explanation, QueryPipeline};
pub use request::DataSourceRequest;
pub use result::DataSourceResult;
pub use source::RecordSource;
