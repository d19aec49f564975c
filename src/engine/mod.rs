//! Execution engine subprocess
//!
//! The engine runs the C program and writes one snapshot line to its stderr per
//! step, then blocks reading a newline from its stdin before continuing. This
//! module wraps that protocol:
//! - [`EngineProcess`]: interactive, one snapshot at a time
//! - [`record_trace`]: run to completion and collect the whole trace
//! - [`SnapshotFeed`]: the pull interface consumed by the stepping UI, also
//!   implemented by [`SnapshotReader`] for replaying saved traces
//!
//! When the engine fails, its stderr carries a diagnostic instead of
//! snapshots: the failing line, the failing column, then the message.

pub mod errors;

pub use errors::EngineError;

use crate::snapshot::{Snapshot, SnapshotReader};
use crate::trace::{ErrorStep, TraceResult};
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdin, Command, ExitStatus, Stdio};
use tracing::{debug, info, warn};

/// Source of snapshots for step-by-step consumption
pub trait SnapshotFeed {
    /// Block for the next snapshot; None once the trace has ended
    fn next_snapshot(&mut self) -> Option<Snapshot>;

    /// Let the producer continue past the snapshot just consumed
    fn resume(&mut self) -> Result<(), EngineError>;

    /// Release the producer once the trace has ended, reporting a failure
    /// step if the producer failed
    fn close(self: Box<Self>) -> Result<Option<ErrorStep>, EngineError> {
        Ok(None)
    }
}

impl<R: BufRead> SnapshotFeed for SnapshotReader<R> {
    fn next_snapshot(&mut self) -> Option<Snapshot> {
        self.next()
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// How an engine run ended
#[derive(Debug)]
pub struct EngineOutcome {
    pub status: ExitStatus,
    /// Present when the engine exited unsuccessfully
    pub error: Option<ErrorStep>,
}

/// A running engine paced one step at a time
pub struct EngineProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    snapshots: SnapshotReader<BufReader<ChildStderr>>,
}

impl EngineProcess {
    /// Start `engine` on `program` with piped stdin and stderr. The traced
    /// program's own output goes to `stdout`.
    pub fn spawn(
        engine: &Path,
        program: &Path,
        stdout: impl Into<Stdio>,
    ) -> Result<Self, EngineError> {
        let mut child = Command::new(engine)
            .arg(program)
            .stdin(Stdio::piped())
            .stdout(stdout)
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                engine: engine.to_path_buf(),
                source,
            })?;

        let stdin = child.stdin.take();
        let stderr = child.stderr.take().ok_or(EngineError::MissingPipe("stderr"))?;
        info!(
            engine = %engine.display(),
            program = %program.display(),
            pid = child.id(),
            "Engine started"
        );

        Ok(EngineProcess {
            child,
            stdin,
            snapshots: SnapshotReader::new(BufReader::new(stderr)),
        })
    }

    /// Close stdin, drain the remaining diagnostic output and wait for exit.
    ///
    /// An engine whose trace has not ended yet is killed first; its exit is
    /// not reported as a failure.
    pub fn finish(mut self) -> Result<EngineOutcome, EngineError> {
        drop(self.stdin.take());

        let abandoned = !self.snapshots.is_finished();
        if abandoned {
            info!(steps = self.snapshots.decoded(), "Stopping engine mid-trace");
            if let Err(e) = self.child.kill() {
                debug!(error = %e, "Engine already exited");
            }
        }

        let (mut stderr, rejected) = self.snapshots.into_parts();
        let mut rest = Vec::new();
        stderr.read_to_end(&mut rest)?;
        let mut diagnostic = rejected.unwrap_or_default();
        diagnostic.push_str(&String::from_utf8_lossy(&rest));

        let status = self.child.wait()?;
        let error = if status.success() || abandoned {
            None
        } else {
            warn!(%status, "Engine failed");
            Some(ErrorStep::from_diagnostic(&diagnostic))
        };
        debug!(%status, "Engine exited");

        Ok(EngineOutcome { status, error })
    }
}

impl SnapshotFeed for EngineProcess {
    fn next_snapshot(&mut self) -> Option<Snapshot> {
        self.snapshots.next()
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        let stdin = self.stdin.as_mut().ok_or(EngineError::Closed)?;
        stdin
            .write_all(b"\n")
            .and_then(|()| stdin.flush())
            .map_err(|_| EngineError::Closed)
    }

    fn close(self: Box<Self>) -> Result<Option<ErrorStep>, EngineError> {
        Ok((*self).finish()?.error)
    }
}

/// Run the engine to completion and build the full trace.
///
/// A non-zero exit turns the trace into a single error step.
pub fn record_trace(
    engine: &Path,
    program: &Path,
    context_width: usize,
) -> Result<TraceResult, EngineError> {
    let code = fs::read_to_string(program).map_err(|source| EngineError::Source {
        path: PathBuf::from(program),
        source,
    })?;

    let output = Command::new(engine)
        .arg(program)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| EngineError::Spawn {
            engine: engine.to_path_buf(),
            source,
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !output.status.success() {
        warn!(status = %output.status, "Engine failed");
        return Ok(TraceResult::engine_failure(&code, &stderr));
    }

    Ok(TraceResult::from_lines(&code, stderr.lines(), context_width))
}
