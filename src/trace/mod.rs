//! Step sessions and recorded traces
//!
//! - [`StepSession`]: turns snapshots into rendered steps, one at a time,
//!   keeping only the previous step's stack for change detection
//! - [`TraceResult`]: a whole recorded trace, paired with the program source,
//!   as returned to a web front end
//! - [`ErrorStep`]: the terminal step reported when the engine fails

use crate::memory::stack::Stack;
use crate::render::{diff_stacks, StackView};
use crate::snapshot::{Snapshot, SnapshotReader};
use crate::source::SourceListing;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use tracing::{debug, info};

/// Context half-width used when none is configured
pub const DEFAULT_CONTEXT_WIDTH: usize = 6;

/// Event name carried by an [`ErrorStep`]
pub const ERROR_EVENT: &str = "error";

/// One rendered step
#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    /// Zero-based line about to execute
    pub line: usize,
    pub column: usize,
    pub context: Vec<String>,
    pub stack: StackView,
}

impl StepView {
    /// Context window followed by the stack rendering
    pub fn lines(&self) -> Vec<String> {
        let mut lines = self.context.clone();
        lines.extend(self.stack.lines());
        lines
    }
}

/// Engine failure reported in place of normal steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorStep {
    pub exception_msg: String,
    pub line: String,
    pub offset: String,
    pub event: String,
}

impl ErrorStep {
    /// Build from the engine's diagnostic output: failing line, failing
    /// column, then the message
    pub fn from_diagnostic(diagnostic: &str) -> Self {
        let mut parts = diagnostic.split('\n');
        let line = parts.next().unwrap_or_default().trim().to_string();
        let offset = parts.next().unwrap_or_default().trim().to_string();
        let exception_msg = parts.collect::<Vec<_>>().join("\n");
        ErrorStep {
            exception_msg,
            line,
            offset,
            event: ERROR_EVENT.to_string(),
        }
    }
}

/// Entry of a recorded trace
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TraceStep {
    Step(StepView),
    Error(ErrorStep),
}

/// A recorded trace together with the traced source
#[derive(Debug, Clone, Serialize)]
pub struct TraceResult {
    pub code: String,
    pub trace: Vec<TraceStep>,
}

impl TraceResult {
    /// Decode and render every snapshot in `lines`, stopping at the first
    /// line that does not decode
    pub fn from_lines<'a>(
        code: &str,
        lines: impl IntoIterator<Item = &'a str>,
        context_width: usize,
    ) -> Self {
        let joined: String = lines.into_iter().flat_map(|l| [l, "\n"]).collect();
        Self::from_reader(code, joined.as_bytes(), context_width)
    }

    /// Decode and render every snapshot from a buffered reader
    pub fn from_reader<R: BufRead>(code: &str, reader: R, context_width: usize) -> Self {
        let mut session = StepSession::new(SourceListing::new(code), context_width);
        let trace = SnapshotReader::new(reader)
            .map(|snapshot| TraceStep::Step(session.advance(&snapshot)))
            .collect::<Vec<_>>();
        info!(steps = trace.len(), "Recorded trace");
        TraceResult {
            code: code.to_string(),
            trace,
        }
    }

    /// Trace consisting of the single error step for a failed run
    pub fn engine_failure(code: &str, diagnostic: &str) -> Self {
        TraceResult {
            code: code.to_string(),
            trace: vec![TraceStep::Error(ErrorStep::from_diagnostic(diagnostic))],
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.trace.last(), Some(TraceStep::Error(_)))
    }
}

/// Per-step reconstruction with a single retained stack
pub struct StepSession {
    source: SourceListing,
    context_width: usize,
    retained: Stack,
    steps: usize,
}

impl StepSession {
    pub fn new(source: SourceListing, context_width: usize) -> Self {
        StepSession {
            source,
            context_width,
            retained: Stack::new(),
            steps: 0,
        }
    }

    /// Build, resolve and render the stack of `snapshot`, diffed against the
    /// previous step. The new stack replaces the retained one.
    pub fn advance(&mut self, snapshot: &Snapshot) -> StepView {
        let stack = Stack::from_snapshot(snapshot);
        let view = diff_stacks(&stack, &self.retained);
        let context = self
            .source
            .context(snapshot.line, snapshot.column, self.context_width);

        self.retained = stack;
        self.steps += 1;
        debug!(
            step = self.steps,
            frames = view.frames.len(),
            changed = view.changed_count(),
            "Rendered step"
        );

        StepView {
            line: snapshot.line,
            column: snapshot.column,
            context,
            stack: view,
        }
    }

    pub fn source(&self) -> &SourceListing {
        &self.source
    }

    pub fn context_width(&self) -> usize {
        self.context_width
    }

    /// Stack of the most recent step (empty before the first)
    pub fn retained(&self) -> &Stack {
        &self.retained
    }

    /// Number of steps rendered so far
    pub fn steps(&self) -> usize {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_step_from_diagnostic() {
        let step = ErrorStep::from_diagnostic("7\n12\nundefined 'y'\nin main\n");
        assert_eq!(step.line, "7");
        assert_eq!(step.offset, "12");
        assert_eq!(step.exception_msg, "undefined 'y'\nin main\n");
        assert_eq!(step.event, "error");
    }

    #[test]
    fn test_error_step_short_diagnostic() {
        let step = ErrorStep::from_diagnostic("3");
        assert_eq!(step.line, "3");
        assert_eq!(step.offset, "");
        assert_eq!(step.exception_msg, "");
    }

    #[test]
    fn test_error_trace_serializes_flat() {
        let result = TraceResult::engine_failure("int main() {}", "1\n2\nboom");
        assert!(result.is_error());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["code"], "int main() {}");
        assert_eq!(json["trace"][0]["event"], "error");
        assert_eq!(json["trace"][0]["exception_msg"], "boom");
        assert_eq!(json["trace"][0]["offset"], "2");
    }
}
