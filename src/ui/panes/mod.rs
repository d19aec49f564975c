//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`source`]: caret-annotated context window around the executing line
//! - [`stack`]: change-annotated call stack with variables
//! - [`status`]: status bar with keybindings and step state
//!
//! Each pane module exports a primary `render_*` function plus the data or
//! scroll state it needs.

pub mod source;
pub mod stack;
pub mod status;

pub use source::{render_source_pane, SourceRenderData};
pub use stack::{render_stack_pane, StackScrollState};
pub use status::{render_status_bar, StatusRenderData};
