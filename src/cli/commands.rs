//! CLI command implementations
//!
//! Both commands run against the sample employee dataset.

use std::path::Path;

use crate::config::QueryConfig;
use crate::pipeline::{DataSourceRequest, DataSourceResult, Explanation, QueryPipeline};
use crate::sample::{employees, Employee};

use super::args::Command;
use super::errors::CliResult;
use super::io::{read_request, write_json};

/// Main entry point for CLI
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Query {
            request,
            config,
            pretty,
        } => query(request.as_deref(), config.as_deref(), pretty),
        Command::Explain { request, config } => explain(request.as_deref(), config.as_deref()),
    }
}

/// Execute a request and print the result envelope
pub fn query(
    request_path: Option<&Path>,
    config_path: Option<&Path>,
    pretty: bool,
) -> CliResult<()> {
    let config = load_config(config_path)?;
    let request = read_request(request_path)?;
    let result = run_query(&config, &request)?;
    write_json(&result, pretty)
}

/// Print the compiled filter and sort keys of a request
pub fn explain(request_path: Option<&Path>, config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let request = read_request(request_path)?;
    write_json(&explain_request(&config, &request), true)
}

/// Runs a request over the sample dataset
pub fn run_query(
    config: &QueryConfig,
    request: &DataSourceRequest,
) -> CliResult<DataSourceResult<Employee>> {
    let pipeline = QueryPipeline::new(config.clone());
    Ok(pipeline.execute(employees(), request)?)
}

pub fn explain_request(config: &QueryConfig, request: &DataSourceRequest) -> Explanation {
    QueryPipeline::new(config.clone()).explain::<Employee>(request)
}

fn load_config(path: Option<&Path>) -> CliResult<QueryConfig> {
    match path {
        Some(path) => Ok(QueryConfig::load(path)?),
        None => Ok(QueryConfig::default()),
    }
}
