//! Query Executor subsystem
//!
//! Stages that run after filtering, each compiled against the record
//! schema before any record is touched:
//!
//! - `RecordSorter`: stable multi-key sort
//! - `Aggregator`: sum/average/min/max/count per field
//! - `Page`: take/skip window
//! - `GroupingEngine`: recursive partitioning with per-group aggregates
//!
//! Compilation errors from these stages are terminal.

mod aggregator;
mod grouping;
mod page;
mod sorter;

pub use aggregator::{AggregateKind, AggregateRequest, Aggregates, Aggregator};
pub use grouping::{GroupItems, GroupResult, GroupSpec, GroupingEngine};
pub use page::Page;
pub use sorter::{RecordSorter, SortDirection, SortKey};
