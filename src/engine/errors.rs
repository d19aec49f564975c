//! Error types for talking to the execution engine
//!
//! Stream-end conditions are not errors: a trace that stops decoding simply
//! ends. [`EngineError`] covers the process plumbing around it.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine executable could not be started
    #[error("failed to start engine {}: {source}", .engine.display())]
    Spawn {
        engine: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The program source could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A pipe that should have been set up is not there
    #[error("engine {0} pipe unavailable")]
    MissingPipe(&'static str),

    /// The engine no longer accepts input
    #[error("engine closed its input")]
    Closed,

    #[error(transparent)]
    Io(#[from] io::Error),
}
