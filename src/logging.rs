//! Logging setup
//!
//! Installs a `tracing` subscriber filtered by `RUST_LOG` (default `info`).
//! While the TUI owns the terminal, logs go to a file instead of stderr.

use eyre::{eyre, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Default log file for interactive sessions
pub fn default_log_path() -> PathBuf {
    std::env::temp_dir().join("cstep.log")
}

/// Initialize logging, to `log_file` if given, otherwise to stderr
pub fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .try_init()
                .map_err(|e| eyre!("Failed to initialize tracing subscriber: {}", e))?;
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(io::stderr)
                .with_target(true)
                .try_init()
                .map_err(|e| eyre!("Failed to initialize tracing subscriber: {}", e))?;
        }
    }

    Ok(())
}
