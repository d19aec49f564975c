//! # Introduction
//!
//! cstep visualizes the step-by-step execution of a small C program. An
//! external execution engine writes one JSON snapshot per step (current
//! position plus a flat, address-annotated variable list); cstep rebuilds the
//! call stack from each snapshot, resolves pointers to the variables or array
//! elements they target, and highlights what changed since the previous step.
//!
//! ## Pipeline
//!
//! ```text
//! Engine → Snapshot line → Stack (frames + variables) → Pointer resolution
//!        → Diff against previous Stack → Rendering (+ source context)
//! ```
//!
//! 1. [`snapshot`]: decodes trace lines; an undecodable line ends the trace.
//! 2. [`memory`]: the frame/variable arena and the pointer resolver.
//! 3. [`render`]: change-annotated rendering of a resolved stack.
//! 4. [`source`]: caret-annotated context window around the current line.
//! 5. [`trace`]: per-step sessions and whole recorded traces.
//! 6. [`engine`]: the engine subprocess and its pacing protocol.
//! 7. [`ui`]: ratatui-based interactive stepper; not part of the stable
//!    library API.

pub mod engine;
pub mod logging;
pub mod memory;
pub mod render;
pub mod snapshot;
pub mod source;
pub mod trace;
pub mod ui;
