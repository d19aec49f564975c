//! Reconstructed memory model
//!
//! This module turns the engine's flat, address-annotated variable list into a
//! structured view of the program's state:
//! - [`value`]: tagged value representation (scalars, arrays, pointer targets)
//! - [`stack`]: frame/variable arena built from one snapshot
//! - [`resolve`]: pointer resolution against the live variables of a stack
//!
//! # Addresses
//!
//! There is no access to the traced program's memory. Every relationship
//! (which pointer targets which variable or array element) is inferred from
//! base addresses and element sizes alone:
//! ```text
//! element k of v  →  v.address + k * v.unit_size
//! ```
//! Stack slots are recycled after a function returns, so nothing inferred for
//! one snapshot is carried over to the next.

pub mod resolve;
pub mod stack;
pub mod value;

pub use stack::{Frame, FrameId, Scope, Stack, VarId, Variable};
pub use value::{Address, PointerTarget, Scalar, TypeTag, Value};
