//! # Filter Subsystem
//!
//! Flow:
//! 1. Wire `FilterDescriptor` is parsed into a typed `FilterNode` tree
//! 2. The tree is normalized once (local time, day ranges, decimals)
//! 3. `FilterCompiler` resolves every leaf against the record schema and
//!    builds a `Predicate<T>` plus the equivalent `QueryExpression`
//!
//! Operator/type rules depend on the configured `FilterMode`.

mod ast;
mod compiler;
mod normalize;

pub use ast::{Condition, FilterDescriptor, FilterNode, Logic, Operator};
pub use compiler::{CompiledFilter, FilterCompiler, Predicate, QueryExpression};
pub use normalize::normalize;
