//! CLI argument definitions using clap
//!
//! Commands:
//! - gridquery query [--request <path>] [--config <path>] [--pretty]
//! - gridquery explain [--request <path>] [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gridquery - run grid data source requests over the sample dataset
#[derive(Parser, Debug)]
#[command(name = "gridquery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a request and print the result envelope
    Query {
        /// Path to request JSON (stdin when omitted)
        #[arg(long)]
        request: Option<PathBuf>,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the compiled filter expression and effective sort keys
    Explain {
        /// Path to request JSON (stdin when omitted)
        #[arg(long)]
        request: Option<PathBuf>,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        let cli = Cli::try_parse_from(["gridquery", "query", "--request", "req.json", "--pretty"])
            .unwrap();
        match cli.command {
            Command::Query {
                request,
                config,
                pretty,
            } => {
                assert_eq!(request, Some(PathBuf::from("req.json")));
                assert!(config.is_none());
                assert!(pretty);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_explain() {
        let cli = Cli::try_parse_from(["gridquery", "explain", "--config", "grid.json"]).unwrap();
        assert!(matches!(cli.command, Command::Explain { config: Some(_), .. }));
    }
}
