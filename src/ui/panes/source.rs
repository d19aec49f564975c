//! Source context pane
//!
//! Shows the caret-annotated context window around the executing line, with
//! line numbers and light C syntax colouring. The window comes from
//! [`SourceListing::window`](crate::source::SourceListing::window), so the pane
//! never scrolls: it is always centred on the current position.

use crate::source::{ContextLine, CARET_PREFIX};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Data needed to render the source pane
pub struct SourceRenderData<'a> {
    pub window: &'a [ContextLine],
    pub file_name: &'a str,
    pub is_error: bool,
}

/// Render the source pane
pub fn render_source_pane(frame: &mut Frame, area: Rect, data: SourceRenderData) {
    let block = Block::default()
        .title(format!(" {} ", data.file_name))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(DEFAULT_THEME.border_normal));

    let lines: Vec<Line> = data
        .window
        .iter()
        .map(|context_line| match context_line {
            ContextLine::Blank => Line::raw(""),
            ContextLine::Source {
                number,
                text,
                is_current,
            } => source_line(*number, text, *is_current, data.is_error),
            ContextLine::Caret { column } => Line::from(vec![
                Span::raw("     "),
                Span::styled(
                    format!("{}{}^", CARET_PREFIX, "-".repeat(*column)),
                    Style::default()
                        .fg(DEFAULT_THEME.secondary)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn source_line(number: usize, text: &str, is_current: bool, is_error: bool) -> Line<'static> {
    // Line numbers are shown one-based
    let number_style = if is_current {
        Style::default()
            .fg(DEFAULT_THEME.secondary)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.comment)
    };

    let mut spans = vec![Span::styled(format!("{:4} ", number + 1), number_style)];
    let mut content = highlight_source_code(text);
    if is_current {
        let background = if is_error {
            Style::default().bg(DEFAULT_THEME.error)
        } else {
            Style::default().bg(DEFAULT_THEME.current_line_bg)
        };
        for span in &mut content {
            span.style = span.style.patch(background);
        }
    }
    spans.extend(content);
    Line::from(spans)
}

/// Split a line into coloured spans: comments, string literals, keywords,
/// type names, calls and everything else
fn highlight_source_code(line: &str) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut rest = line;

    while let Some(c) = rest.chars().next() {
        if rest.starts_with("//") {
            spans.push(Span::styled(
                rest.to_string(),
                Style::default().fg(DEFAULT_THEME.comment),
            ));
            break;
        }

        let len = if c == '"' || c == '\'' {
            literal_len(rest, c)
        } else if c.is_alphanumeric() || c == '_' {
            rest.find(|ch: char| !ch.is_alphanumeric() && ch != '_')
                .unwrap_or(rest.len())
        } else {
            c.len_utf8()
        };

        let (token, tail) = rest.split_at(len);
        let is_call = tail.starts_with('(');
        spans.push(Span::styled(token.to_string(), token_style(token, is_call)));
        rest = tail;
    }

    spans
}

/// Length of a quoted literal, including both quotes when closed
fn literal_len(text: &str, quote: char) -> usize {
    let mut escaped = false;
    for (i, ch) in text.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == quote {
            return i + ch.len_utf8();
        }
    }
    text.len()
}

fn token_style(token: &str, is_call: bool) -> Style {
    match token {
        "int" | "char" | "void" | "short" | "long" | "unsigned" | "signed" | "float"
        | "double" => Style::default().fg(DEFAULT_THEME.type_name),
        "struct" | "union" | "enum" | "return" | "if" | "else" | "while" | "for" | "do"
        | "switch" | "case" | "default" | "break" | "continue" | "goto" | "sizeof" => {
            Style::default()
                .fg(DEFAULT_THEME.primary)
                .add_modifier(Modifier::BOLD)
        }
        "NULL" => Style::default().fg(DEFAULT_THEME.number),
        _ if token.starts_with('"') || token.starts_with('\'') => {
            Style::default().fg(DEFAULT_THEME.secondary)
        }
        _ if token.starts_with(|c: char| c.is_ascii_digit()) => {
            Style::default().fg(DEFAULT_THEME.number)
        }
        _ if is_call => Style::default().fg(DEFAULT_THEME.function),
        _ => Style::default().fg(DEFAULT_THEME.fg),
    }
}
