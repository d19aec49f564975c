//! Source listing and the caret-annotated context window
//!
//! The window is a fixed number of lines centred on the executing line. Lines
//! that fall outside the listing are blank, and the executing line is followed
//! by a caret line pointing at the current column:
//!
//! ```text
//!   int x = 5;
//!   x = x + 1;
//! >-----^
//!   return x;
//! ```

use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Prefix of a caret line
pub const CARET_PREFIX: &str = ">-";

/// One line of a context window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContextLine {
    /// Index outside the listing
    Blank,
    /// Zero-based line number and its text
    Source {
        number: usize,
        text: String,
        is_current: bool,
    },
    /// Marker under the current line
    Caret { column: usize },
}

impl fmt::Display for ContextLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextLine::Blank => Ok(()),
            ContextLine::Source { text, .. } => write!(f, "  {}", text),
            ContextLine::Caret { column } => {
                write!(f, "{}{}^", CARET_PREFIX, "-".repeat(*column))
            }
        }
    }
}

/// Immutable source of the traced program
#[derive(Debug, Clone, Default)]
pub struct SourceListing {
    text: String,
    lines: Vec<String>,
}

impl SourceListing {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let lines = text.lines().map(str::to_string).collect();
        SourceListing { text, lines }
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        Ok(SourceListing::new(fs::read_to_string(path)?))
    }

    /// The full source text as loaded
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Structured window of `2 * width + 1` lines around `line`, plus the
    /// caret line when `line` is inside the listing.
    ///
    /// The caret never runs past the end of the current line.
    pub fn window(&self, line: usize, column: usize, width: usize) -> Vec<ContextLine> {
        let span = width.saturating_mul(2);
        let mut window = Vec::with_capacity(span.saturating_add(2).min(self.lines.len() + 2));
        for offset in 0..=span {
            let index = line.checked_add(offset).and_then(|i| i.checked_sub(width));
            match index.and_then(|i| self.lines.get(i).map(|text| (i, text))) {
                Some((number, text)) => {
                    let is_current = number == line;
                    window.push(ContextLine::Source {
                        number,
                        text: text.clone(),
                        is_current,
                    });
                    if is_current {
                        let column = column.min(text.chars().count());
                        window.push(ContextLine::Caret { column });
                    }
                }
                None => window.push(ContextLine::Blank),
            }
        }
        window
    }

    /// Text form of [`SourceListing::window`]
    pub fn context(&self, line: usize, column: usize, width: usize) -> Vec<String> {
        self.window(line, column, width)
            .iter()
            .map(ContextLine::to_string)
            .collect()
    }
}
