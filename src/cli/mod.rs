//! CLI module for gridquery
//!
//! Provides command-line interface for:
//! - query: run a request over the sample dataset
//! - explain: show the compiled filter and sort keys

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{explain, explain_request, query, run, run_command, run_query};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_request, read_request, write_json};
