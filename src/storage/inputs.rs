//! Plain-text input sequences.
//!
//! One input vector per line, components separated by whitespace and/or
//! commas. Blank lines and lines starting with `#` are skipped.

use crate::error::{RdsomError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Reads an input sequence from a file.
pub fn read_inputs<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<f64>>> {
    let file = File::open(path)?;
    parse_inputs(BufReader::new(file))
}

/// Parses an input sequence. All vectors must have the same length.
pub fn parse_inputs<R: BufRead>(reader: R) -> Result<Vec<Vec<f64>>> {
    let mut inputs: Vec<Vec<f64>> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let values = trimmed
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<f64>().map_err(|e| {
                    RdsomError::Serialization(format!("line {}: '{}': {}", line_no + 1, s, e))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        if let Some(first) = inputs.first() {
            if first.len() != values.len() {
                return Err(RdsomError::DimensionMismatch {
                    expected: first.len(),
                    found: values.len(),
                });
            }
        }
        inputs.push(values);
    }

    Ok(inputs)
}
