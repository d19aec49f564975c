//! Call stack reconstruction
//!
//! This module rebuilds the call stack of one snapshot from the engine's flat
//! variable list:
//! - [`Stack`]: arena owning every [`Frame`] and [`Variable`] of one snapshot
//! - [`Frame`]: one scope instance (globals or a function activation)
//! - [`Variable`]: a typed, addressed value that knows its owning frame
//! - [`Scope`]: global scope or a named function
//!
//! # Ownership
//!
//! Frames and variables live in flat vectors inside the [`Stack`]; frames refer
//! to their variables by [`VarId`] and variables refer back by [`FrameId`].
//! Nothing is shared between stacks: every snapshot builds a fresh arena.
//!
//! # Frame Order
//!
//! The engine lists the innermost function first and the globals last. Each
//! change of scope while walking that list starts a new frame which is
//! prepended, so the frame started last comes first in [`Stack::frames`].

use super::value::{Address, Scalar, TypeTag, Value};
use crate::snapshot::{RawValue, RawVariableRecord, Snapshot, VarSlot};
use rustc_hash::FxHashMap;
use std::fmt;
use tracing::debug;

/// Global bookkeeping variable holding the program's exit value
pub const EXIT_VALUE_SENTINEL: &str = "__exit_value";

/// Trailing marker the engine appends to every array value
pub const ARRAY_TERMINATOR: &str = "_dummy";

/// Lexical scope a frame belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Function(String),
}

impl Scope {
    /// Map the engine's `function` field; the empty string is global scope
    pub fn from_function(function: &str) -> Self {
        if function.is_empty() {
            Scope::Global
        } else {
            Scope::Function(function.to_string())
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Scope::Global)
    }

    pub fn matches_function(&self, function: &str) -> bool {
        match self {
            Scope::Global => function.is_empty(),
            Scope::Function(name) => name == function,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => write!(f, "__GLOBALS__"),
            Scope::Function(name) => write!(f, "{}()", name),
        }
    }
}

/// Index of a frame inside its [`Stack`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(usize);

/// Index of a variable inside its [`Stack`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(usize);

/// A traced variable
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub type_tag: TypeTag,
    pub address: Address,
    pub unit_size: u64,
    pub value: Value,
    frame: FrameId,
}

impl Variable {
    /// Number of bytes covered by this variable, as far as the trace tells
    pub fn byte_len(&self) -> u64 {
        match self.value.array_len() {
            Some(len) => self.unit_size.saturating_mul(len as u64),
            None => self.unit_size,
        }
    }
}

/// Change detection compares declared type and value only.
impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.type_tag == other.type_tag && self.value == other.value
    }
}

/// One scope instance
#[derive(Debug, Clone)]
pub struct Frame {
    pub scope: Scope,
    locals: FxHashMap<String, VarId>,
    insertion_order: Vec<VarId>, // Engine order, used as the resolver's scan order
}

impl Frame {
    fn new(scope: Scope) -> Self {
        Frame {
            scope,
            locals: FxHashMap::default(),
            insertion_order: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.insertion_order.is_empty()
    }

    /// Variable names in sorted order
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.locals.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// All frames of one snapshot, most recently started first
#[derive(Debug, Clone, Default)]
pub struct Stack {
    frames: Vec<Frame>,
    order: Vec<FrameId>,
    variables: Vec<Variable>,
}

impl Stack {
    /// An empty stack, used as the predecessor of the first snapshot
    pub fn new() -> Self {
        Stack::default()
    }

    /// Build the stack for one snapshot and resolve its pointers
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut stack = Stack::build(&snapshot.vars);
        stack.resolve_pointers();
        stack
    }

    /// Group the flat variable list into frames.
    ///
    /// The final slot is the stream terminator and is always discarded. The
    /// initial global frame is kept as the deepest frame unless it stayed empty
    /// and a later global frame was started, so a snapshot holding only
    /// globals still shows them.
    pub fn build(slots: &[VarSlot]) -> Self {
        let mut stack = Stack::new();
        let initial = stack.alloc_frame(Scope::Global);
        let mut current = initial;

        let records = slots.split_last().map(|(_, rest)| rest).unwrap_or(&[]);
        for slot in records {
            let record = match slot {
                VarSlot::Record(record) => record,
                VarSlot::Terminator(marker) => {
                    debug!(marker = %marker, "Skipping stray marker in variable list");
                    continue;
                }
            };

            if !stack.frames[current.0].scope.matches_function(&record.function) {
                current = stack.alloc_frame(Scope::from_function(&record.function));
                stack.order.insert(0, current);
            }

            if stack.frames[current.0].scope.is_global() && record.name == EXIT_VALUE_SENTINEL {
                continue;
            }

            stack.add_variable(current, record);
        }

        let initial_needed = !stack.frames[initial.0].is_empty()
            || !stack.order.iter().any(|id| stack.frames[id.0].scope.is_global());
        if initial_needed {
            stack.order.push(initial);
        }

        stack
    }

    fn alloc_frame(&mut self, scope: Scope) -> FrameId {
        self.frames.push(Frame::new(scope));
        FrameId(self.frames.len() - 1)
    }

    fn add_variable(&mut self, frame: FrameId, record: &RawVariableRecord) {
        let variable = Variable {
            name: record.name.clone(),
            type_tag: record.type_tag,
            address: record.address,
            unit_size: record.unit_size,
            value: value_from_raw(record.value.as_ref()),
            frame,
        };

        // Names are unique within a frame; a repeated name replaces in place
        if let Some(&existing) = self.frames[frame.0].locals.get(&record.name) {
            self.variables[existing.0] = variable;
            return;
        }

        self.variables.push(variable);
        let id = VarId(self.variables.len() - 1);
        let frame = &mut self.frames[frame.0];
        frame.locals.insert(record.name.clone(), id);
        frame.insertion_order.push(id);
    }

    /// Frames in display order (most recently started first)
    pub fn frames(&self) -> impl Iterator<Item = &Frame> + '_ {
        self.order.iter().map(move |id| &self.frames[id.0])
    }

    /// Get the frame at a display position
    pub fn frame_at(&self, position: usize) -> Option<&Frame> {
        self.order.get(position).map(|id| &self.frames[id.0])
    }

    /// Frame that owns `variable`
    pub fn frame_of(&self, variable: &Variable) -> &Frame {
        &self.frames[variable.frame.0]
    }

    pub(crate) fn variable_mut(&mut self, id: VarId) -> &mut Variable {
        &mut self.variables[id.0]
    }

    /// Look up a variable by name in a frame
    pub fn get(&self, frame: &Frame, name: &str) -> Option<&Variable> {
        frame.locals.get(name).map(|id| &self.variables[id.0])
    }

    /// Variables of a frame in engine order
    pub fn variables_of<'a>(
        &'a self,
        frame: &'a Frame,
    ) -> impl Iterator<Item = (VarId, &'a Variable)> + 'a {
        frame
            .insertion_order
            .iter()
            .map(move |id| (*id, &self.variables[id.0]))
    }

    /// Every variable in scan order: frames in display order, then engine order
    pub fn scan_order(&self) -> impl Iterator<Item = (VarId, &Variable)> + '_ {
        self.frames().flat_map(move |frame| self.variables_of(frame))
    }

    /// Find a variable by scope and name
    pub fn lookup(&self, scope: &Scope, name: &str) -> Option<&Variable> {
        self.frames()
            .find(|frame| &frame.scope == scope)
            .and_then(|frame| self.get(frame, name))
    }

    /// Get the depth of the reconstructed stack
    pub fn depth(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Convert a raw engine value, stripping the array terminator
fn value_from_raw(raw: Option<&RawValue>) -> Value {
    match raw {
        None => Value::Missing,
        Some(RawValue::Scalar(scalar)) => Value::Scalar(scalar.clone()),
        Some(RawValue::Array(elements)) => Value::Array(strip_terminator(elements)),
    }
}

fn strip_terminator(elements: &[Scalar]) -> Vec<Scalar> {
    match elements.split_last() {
        Some((last, rest)) if last.is_text(ARRAY_TERMINATOR) => rest.to_vec(),
        _ => elements.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::decode_line;

    fn stack_from(json: &str) -> Stack {
        let snapshot = decode_line(json).unwrap().unwrap();
        Stack::build(&snapshot.vars)
    }

    #[test]
    fn test_frames_prepended_on_scope_change() {
        let stack = stack_from(
            r#"{"line":0,"column":0,"vars":[
                {"function":"add","name":"a","type":"Int","address":200,"unit_size":4,"value":1},
                {"function":"main","name":"r","type":"Int","address":100,"unit_size":4,"value":0},
                {"function":"","name":"g","type":"Int","address":10,"unit_size":4,"value":7},
                "_dummy"]}"#,
        );

        let scopes: Vec<String> = stack.frames().map(|f| f.scope.to_string()).collect();
        assert_eq!(scopes, vec!["__GLOBALS__", "main()", "add()"]);
        assert_eq!(stack.depth(), 3);
    }

    #[test]
    fn test_exit_value_sentinel_skipped() {
        let stack = stack_from(
            r#"{"line":0,"column":0,"vars":[
                {"function":"main","name":"x","type":"Int","address":100,"unit_size":4,"value":0},
                {"function":"","name":"__exit_value","type":"Int","address":8,"unit_size":4,"value":0},
                "_dummy"]}"#,
        );

        let globals = stack.frame_at(0).unwrap();
        assert!(globals.scope.is_global());
        assert!(globals.is_empty());
        assert!(stack.lookup(&Scope::Global, EXIT_VALUE_SENTINEL).is_none());
    }

    #[test]
    fn test_only_globals_still_registered() {
        let stack = stack_from(
            r#"{"line":0,"column":0,"vars":[
                {"function":"","name":"x","type":"Int","address":16,"unit_size":4,"value":5},
                "_dummy"]}"#,
        );

        assert_eq!(stack.depth(), 1);
        let x = stack.lookup(&Scope::Global, "x").unwrap();
        assert_eq!(x.value, Value::Scalar(Scalar::Int(5)));
    }

    #[test]
    fn test_leading_globals_become_deepest_frame() {
        let stack = stack_from(
            r#"{"line":0,"column":0,"vars":[
                {"function":"","name":"g","type":"Int","address":16,"unit_size":4,"value":5},
                {"function":"main","name":"x","type":"Int","address":100,"unit_size":4,"value":1},
                "_dummy"]}"#,
        );

        let scopes: Vec<String> = stack.frames().map(|f| f.scope.to_string()).collect();
        assert_eq!(scopes, vec!["main()", "__GLOBALS__"]);
    }

    #[test]
    fn test_empty_snapshot_has_global_frame() {
        let stack = stack_from(r#"{"line":0,"column":0,"vars":["_dummy"]}"#);
        assert_eq!(stack.depth(), 1);
        assert!(stack.frame_at(0).unwrap().is_empty());
    }

    #[test]
    fn test_array_terminator_stripped() {
        let stack = stack_from(
            r#"{"line":0,"column":0,"vars":[
                {"function":"main","name":"a","type":"Int","address":100,"unit_size":4,"value":[1,2,3,"_dummy"]},
                {"function":"main","name":"e","type":"Int","address":200,"unit_size":4,"value":["_dummy"]},
                "_dummy"]}"#,
        );

        let main = Scope::Function("main".into());
        let a = stack.lookup(&main, "a").unwrap();
        assert_eq!(a.value.array_len(), Some(3));
        assert_eq!(a.byte_len(), 12);
        let e = stack.lookup(&main, "e").unwrap();
        assert_eq!(e.value.array_len(), Some(0));
    }

    #[test]
    fn test_missing_value_kept_as_missing() {
        let stack = stack_from(
            r#"{"line":0,"column":0,"vars":[
                {"function":"main","name":"c","type":"Char","address":100},
                "_dummy"]}"#,
        );

        let c = stack.lookup(&Scope::Function("main".into()), "c").unwrap();
        assert_eq!(c.value, Value::Missing);
        assert_eq!(c.unit_size, 0);
    }

    #[test]
    fn test_variable_equality_ignores_address() {
        let first = stack_from(
            r#"{"line":0,"column":0,"vars":[
                {"function":"main","name":"x","type":"Int","address":100,"unit_size":4,"value":3},
                "_dummy"]}"#,
        );
        let second = stack_from(
            r#"{"line":0,"column":0,"vars":[
                {"function":"main","name":"x","type":"Long","address":108,"unit_size":8,"value":3},
                {"function":"main","name":"y","type":"Int","address":100,"unit_size":4,"value":3},
                "_dummy"]}"#,
        );

        let main = Scope::Function("main".into());
        let x = first.lookup(&main, "x").unwrap();
        assert_ne!(x, second.lookup(&main, "x").unwrap());
        assert_eq!(x, second.lookup(&main, "y").unwrap());
    }
}
