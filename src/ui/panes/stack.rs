//! Stack pane rendering
//!
//! Displays the change-annotated [`StackView`] of the current step: one header
//! per frame, then the frame's variables with type and value. New frames and
//! changed variables carry the `*` marker and the theme's change colour.

use crate::render::StackView;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Scroll state for the stack pane
#[derive(Debug, Default)]
pub struct StackScrollState {
    pub offset: usize,
}

/// Render the stack pane
pub fn render_stack_pane(
    frame: &mut Frame,
    area: Rect,
    stack: Option<&StackView>,
    scroll_state: &mut StackScrollState,
) {
    let block = Block::default()
        .title(" Call Stack ")
        .borders(Borders::ALL)
        .border_style(
            Style::default()
                .fg(DEFAULT_THEME.border_focused)
                .add_modifier(Modifier::BOLD),
        );

    let mut all_items = Vec::new();
    match stack {
        None => all_items.push(
            ListItem::new("(waiting for first step)")
                .style(Style::default().fg(DEFAULT_THEME.comment)),
        ),
        Some(view) => {
            for frame_view in &view.frames {
                let header_style = if frame_view.is_new {
                    Style::default()
                        .fg(DEFAULT_THEME.changed)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                        .fg(DEFAULT_THEME.function)
                        .add_modifier(Modifier::BOLD)
                };
                all_items.push(ListItem::new(Line::from(vec![
                    Span::styled(marker(frame_view.is_new), header_style),
                    Span::styled("▸ ", Style::default().fg(DEFAULT_THEME.secondary)),
                    Span::styled(frame_view.name.clone(), header_style),
                ])));

                if frame_view.variables.is_empty() {
                    all_items.push(ListItem::new(Span::styled(
                        "    (no variables)",
                        Style::default().fg(DEFAULT_THEME.comment),
                    )));
                }

                for var in &frame_view.variables {
                    let value_style = if var.changed {
                        Style::default()
                            .fg(DEFAULT_THEME.changed)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(DEFAULT_THEME.fg)
                    };
                    all_items.push(ListItem::new(Line::from(vec![
                        Span::styled(marker(var.changed), value_style),
                        Span::raw("  "),
                        Span::styled(
                            format!("{:<16} ", var.name),
                            Style::default().fg(DEFAULT_THEME.fg),
                        ),
                        Span::styled(
                            format!("{:<12} ", var.type_name),
                            Style::default().fg(DEFAULT_THEME.type_name),
                        ),
                        Span::styled(var.value.clone(), value_style),
                    ])));
                }
            }
        }
    }

    // Clamp scroll offset only if content exceeds visible area
    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    let total_items = all_items.len();
    if total_items > visible_height {
        scroll_state.offset = scroll_state.offset.min(total_items - visible_height);
    } else {
        scroll_state.offset = 0;
    }

    let visible_items: Vec<ListItem> = all_items
        .into_iter()
        .skip(scroll_state.offset)
        .take(visible_height)
        .collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}

fn marker(flagged: bool) -> &'static str {
    if flagged {
        "* "
    } else {
        "  "
    }
}
