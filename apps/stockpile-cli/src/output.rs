//! Printing results. Stdout carries only JSON so output can be piped into
//! `jq`; logs and errors go to stderr.

use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};

use crate::error::{CliError, CliResult};

/// Converts a command result into JSON.
pub fn to_json<T: Serialize>(value: &T) -> CliResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| CliError::internal(format!("Failed to serialize result: {}", e)))
}

/// Writes pretty JSON followed by a newline.
pub fn write_json(mut out: impl Write, value: &Value) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)
}

pub fn print_result(value: &Value) -> io::Result<()> {
    write_json(io::stdout().lock(), value)
}

pub fn print_error(err: &CliError) {
    let value = serde_json::json!({
        "code": err.code,
        "message": err.message,
    });
    if write_json(io::stderr().lock(), &value).is_err() {
        eprintln!("{}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_json_is_pretty_with_newline() {
        let mut buf = Vec::new();
        write_json(&mut buf, &serde_json::json!({ "removed": 3 })).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "{\n  \"removed\": 3\n}\n");
    }
}
