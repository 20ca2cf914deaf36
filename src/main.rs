//! gridquery CLI entry point
//!
//! 1. Installs JSON logging on stderr (`RUST_LOG`, default `warn`)
//! 2. Dispatches to CLI commands (via cli::run)
//! 3. Prints errors to stderr and exits non-zero on failure

use gridquery::cli;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
