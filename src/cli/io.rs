//! JSON I/O handling for CLI
//!
//! - Input: one request JSON document from a file or stdin
//! - Output: one JSON document on stdout
//! - UTF-8 only

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use serde::Serialize;

use crate::pipeline::DataSourceRequest;

use super::errors::{CliError, CliResult};

/// Read a request from `path`, or from stdin when None
pub fn read_request(path: Option<&Path>) -> CliResult<DataSourceRequest> {
    let content = match path {
        Some(path) => fs::read_to_string(path).map_err(|e| {
            CliError::io_error(format!("Failed to read request {}: {}", path.display(), e))
        })?,
        None => {
            let mut buf = String::new();
            io::stdin().lock().read_to_string(&mut buf)?;
            buf
        }
    };

    parse_request(&content)
}

/// Parse request JSON
pub fn parse_request(content: &str) -> CliResult<DataSourceRequest> {
    if content.trim().is_empty() {
        return Err(CliError::invalid_request("Empty input"));
    }
    Ok(serde_json::from_str(content)?)
}

/// Write a JSON document to stdout
pub fn write_json<T: Serialize>(value: &T, pretty: bool) -> CliResult<()> {
    let mut stdout = io::stdout();
    if pretty {
        serde_json::to_writer_pretty(&mut stdout, value)?;
    } else {
        serde_json::to_writer(&mut stdout, value)?;
    }
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_request_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"take": 2, "sort": [{{"field": "Name"}}]}}"#).unwrap();

        let request = read_request(Some(file.path())).unwrap();
        assert_eq!(request.take, 2);
        assert_eq!(request.sort.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = read_request(Some(Path::new("/nonexistent/request.json"))).unwrap_err();
        assert_eq!(err.code_str(), "GRID_CLI_IO_ERROR");
    }

    #[test]
    fn test_empty_and_invalid_input() {
        assert_eq!(
            parse_request("  \n").unwrap_err().code_str(),
            "GRID_CLI_INVALID_REQUEST"
        );
        assert_eq!(
            parse_request(r#"{"take": "ten"}"#).unwrap_err().code_str(),
            "GRID_CLI_INVALID_REQUEST"
        );
    }
}
