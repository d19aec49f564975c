//! Snapshot decoding for the engine's trace stream
//!
//! The execution engine writes one JSON object per program step. Each object
//! carries the current position and a flat list of variables:
//!
//! ```text
//! {"line":4,"column":8,"vars":[{"function":"main","name":"x","type":"Int",
//!   "address":140737,"unit_size":4,"value":5}, ..., "_dummy"]}
//! ```
//!
//! A line that does not decode ends the trace; it is not an error for the
//! caller. Blank lines are skipped.

use crate::memory::value::{Address, Scalar, TypeTag};
use serde::Deserialize;
use std::io::BufRead;
use thiserror::Error;
use tracing::{debug, warn};

/// Snapshot of the traced program at one step
#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    /// Zero-based line of the statement about to execute
    pub line: usize,
    pub column: usize,
    /// Flat variable list; the last slot is a terminator
    pub vars: Vec<VarSlot>,
}

/// One entry of a snapshot's variable list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VarSlot {
    Record(RawVariableRecord),
    Terminator(String),
}

/// A variable exactly as the engine reports it
#[derive(Debug, Clone, Deserialize)]
pub struct RawVariableRecord {
    /// Owning function; empty for globals
    pub function: String,
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: TypeTag,
    pub address: Address,
    /// Omitted by the engine for kinds it does not serialize
    #[serde(default)]
    pub unit_size: u64,
    #[serde(default)]
    pub value: Option<RawValue>,
}

/// Raw variable value: a scalar, or an array ending in a terminator
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Array(Vec<Scalar>),
    Scalar(Scalar),
}

/// Why a trace line could not be decoded
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decode one line of the trace stream.
///
/// Returns `Ok(None)` for blank lines.
pub fn decode_line(line: &str) -> Result<Option<Snapshot>, DecodeError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let snapshot = serde_json::from_str(trimmed)?;
    Ok(Some(snapshot))
}

/// Pull-based reader yielding snapshots until the trace ends
pub struct SnapshotReader<R> {
    reader: R,
    finished: bool,
    decoded: usize,
    rejected: Option<String>,
}

impl<R: BufRead> SnapshotReader<R> {
    pub fn new(reader: R) -> Self {
        SnapshotReader {
            reader,
            finished: false,
            decoded: 0,
            rejected: None,
        }
    }

    /// Number of snapshots decoded so far
    pub fn decoded(&self) -> usize {
        self.decoded
    }

    /// The line that ended the trace, if it ended on an undecodable line
    pub fn rejected(&self) -> Option<&str> {
        self.rejected.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Give back the underlying reader along with the rejected line
    pub fn into_parts(self) -> (R, Option<String>) {
        (self.reader, self.rejected)
    }
}

impl<R: BufRead> Iterator for SnapshotReader<R> {
    type Item = Snapshot;

    fn next(&mut self) -> Option<Snapshot> {
        if self.finished {
            return None;
        }

        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    debug!(decoded = self.decoded, "Trace stream closed");
                    self.finished = true;
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Trace stream read failed");
                    self.finished = true;
                    return None;
                }
            }

            match decode_line(&line) {
                Ok(None) => continue,
                Ok(Some(snapshot)) => {
                    self.decoded += 1;
                    debug!(
                        step = self.decoded,
                        line = snapshot.line,
                        column = snapshot.column,
                        vars = snapshot.vars.len(),
                        "Decoded snapshot"
                    );
                    return Some(snapshot);
                }
                Err(e) => {
                    debug!(error = %e, "Trace ended on undecodable line");
                    self.finished = true;
                    self.rejected = Some(line);
                    return None;
                }
            }
        }
    }
}
