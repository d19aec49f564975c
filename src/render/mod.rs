//! Change-annotated rendering of a resolved stack
//!
//! [`diff_stacks`] compares the stack of the current step with the one retained
//! from the previous step and produces a [`StackView`]: every frame and
//! variable, formatted for display, with change markers.
//!
//! # Frame Matching
//!
//! Frames are compared by position. The frame at position `i` is matched with
//! the old frame at `i` only if the scopes agree at every position up to and
//! including `i`. The first disagreement (or running past the old stack) makes
//! that frame and every frame after it new, even if an identical frame exists
//! elsewhere in the old stack.
//!
//! # Variable Changes
//!
//! In a matched frame a variable is changed if the old frame has no variable of
//! that name or the old variable differs in type or value. In a new frame every
//! variable is changed. Variables are listed in name order.

mod format;

pub use format::{MISSING_LITERAL, NULL_LITERAL};

use crate::memory::stack::{Frame, Stack};
use format::{format_frame_header, format_variable_line};
use serde::Serialize;

/// One rendered variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableView {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: String,
    pub changed: bool,
}

/// One rendered frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameView {
    pub name: String,
    pub is_new: bool,
    pub variables: Vec<VariableView>,
}

/// Rendered stack for one step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StackView {
    pub frames: Vec<FrameView>,
}

impl StackView {
    /// Plain text lines, one per frame header and one per variable
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for frame in &self.frames {
            lines.push(format_frame_header(frame.is_new, &frame.name));
            for var in &frame.variables {
                lines.push(format_variable_line(
                    var.changed,
                    &var.name,
                    &var.type_name,
                    &var.value,
                ));
            }
        }
        lines
    }

    pub fn new_frame_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_new).count()
    }

    pub fn changed_count(&self) -> usize {
        self.frames
            .iter()
            .flat_map(|f| f.variables.iter())
            .filter(|v| v.changed)
            .count()
    }

    /// Find a rendered variable by frame name and variable name
    pub fn variable(&self, frame: &str, name: &str) -> Option<&VariableView> {
        self.frames
            .iter()
            .find(|f| f.name == frame)
            .and_then(|f| f.variables.iter().find(|v| v.name == name))
    }
}

/// Render `current` with changes relative to `previous`
pub fn diff_stacks(current: &Stack, previous: &Stack) -> StackView {
    let mut frames = Vec::with_capacity(current.depth());
    let mut scopes_match = true;

    for (i, frame) in current.frames().enumerate() {
        let old_frame = match previous.frame_at(i) {
            Some(old) if scopes_match && old.scope == frame.scope => Some(old),
            _ => None,
        };
        scopes_match = old_frame.is_some();

        frames.push(render_frame(current, frame, old_frame.map(|old| (previous, old))));
    }

    StackView { frames }
}

fn render_frame(stack: &Stack, frame: &Frame, old: Option<(&Stack, &Frame)>) -> FrameView {
    let variables = frame
        .sorted_names()
        .into_iter()
        .filter_map(|name| stack.get(frame, name))
        .map(|var| {
            let changed = match old {
                Some((old_stack, old_frame)) => old_stack
                    .get(old_frame, &var.name)
                    .map_or(true, |old_var| old_var != var),
                None => true,
            };
            VariableView {
                name: var.name.clone(),
                type_name: var.type_tag.as_str().to_string(),
                value: var.value.to_string(),
                changed,
            }
        })
        .collect();

    FrameView {
        name: frame.scope.to_string(),
        is_new: old.is_none(),
        variables,
    }
}
