//! Line-oriented access traces.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::error::CacheError;

/// Where the key sits on each trace line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TraceFormat {
    /// The n-th whitespace-separated token (`"R 0x1f"` with `Field(1)`)
    Field(usize),
    /// Everything after the first n bytes (`"R 0x1f"` with `Offset(2)`)
    Offset(usize),
}

impl Default for TraceFormat {
    fn default() -> Self {
        TraceFormat::Field(1)
    }
}

impl TraceFormat {
    fn key<'a>(&self, line: &'a str) -> Option<&'a str> {
        match *self {
            TraceFormat::Field(n) => line.split_whitespace().nth(n),
            TraceFormat::Offset(n) => line.get(n..).map(str::trim).filter(|k| !k.is_empty()),
        }
    }
}

/// Reads access keys, one per non-blank line
pub fn parse_trace<R: BufRead>(reader: R, format: TraceFormat) -> Result<Vec<String>, CacheError> {
    let mut keys = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let key = format.key(&line).ok_or_else(|| CacheError::Parse {
            line: index + 1,
            reason: format!("no key at {format:?}"),
        })?;
        keys.push(key.to_string());
    }
    debug!(accesses = keys.len(), ?format, "parsed trace");
    Ok(keys)
}

/// Opens and parses a trace file
pub fn load_trace(path: impl AsRef<Path>, format: TraceFormat) -> Result<Vec<String>, CacheError> {
    let file = File::open(path)?;
    parse_trace(BufReader::new(file), format)
}
