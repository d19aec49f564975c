//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into three layers:
//!
//! - **[`app`]**: application state, keyboard event loop, step pacing
//! - **[`panes`]**: render functions for each visible pane (source context,
//!   stack, status bar)
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with a
//! [`StepSession`] and a [`SnapshotFeed`] and call [`App::run`] to start the
//! event loop.
//!
//! [`StepSession`]: crate::trace::StepSession
//! [`SnapshotFeed`]: crate::engine::SnapshotFeed
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
