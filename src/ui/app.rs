//! Interactive stepping application state and logic

use crate::engine::SnapshotFeed;
use crate::trace::{ErrorStep, StepSession, StepView};
use crate::ui::panes::{
    render_source_pane, render_stack_pane, render_status_bar, SourceRenderData,
    StackScrollState, StatusRenderData,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;
use tracing::{info, warn};

/// The main application state
pub struct App {
    /// Step-by-step reconstruction of the traced program
    session: StepSession,

    /// Where snapshots come from; None once the trace has ended
    feed: Option<Box<dyn SnapshotFeed>>,

    /// Name shown in the source pane title
    file_name: String,

    /// Most recently rendered step
    current: Option<StepView>,

    /// Engine failure reported when the trace ended
    error: Option<ErrorStep>,

    pub stack_scroll: StackScrollState,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,
}

impl App {
    pub fn new(session: StepSession, feed: Box<dyn SnapshotFeed>, file_name: String) -> Self {
        App {
            session,
            feed: Some(feed),
            file_name,
            current: None,
            error: None,
            stack_scroll: StackScrollState::default(),
            should_quit: false,
            status_message: String::from("Ready!"),
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        self.step();

        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Advance to the next snapshot.
    ///
    /// The producer is only resumed once the user asks for the next step, so
    /// the engine stays paused on the step being displayed.
    pub fn step(&mut self) {
        let Some(feed) = self.feed.as_mut() else {
            self.status_message = "Program finished".to_string();
            return;
        };

        if self.current.is_some() {
            if let Err(e) = feed.resume() {
                info!(error = %e, "Engine stopped accepting input");
                self.end_trace();
                return;
            }
        }

        match feed.next_snapshot() {
            Some(snapshot) => {
                let view = self.session.advance(&snapshot);
                self.status_message = format!(
                    "Line {}, column {}",
                    view.line.saturating_add(1),
                    view.column
                );
                self.current = Some(view);
            }
            None => self.end_trace(),
        }
    }

    fn end_trace(&mut self) {
        let Some(feed) = self.feed.take() else {
            return;
        };

        match feed.close() {
            Ok(Some(error)) => {
                let summary = error.exception_msg.lines().next().unwrap_or_default();
                self.status_message = format!("Error at line {}: {}", error.line, summary);
                self.error = Some(error);
            }
            Ok(None) => {
                self.status_message = format!("Program finished after {} steps", self.session.steps());
            }
            Err(e) => {
                warn!(error = %e, "Failed to shut down engine");
                self.status_message = format!("Error: {}", e);
            }
        }
    }

    pub fn current(&self) -> Option<&StepView> {
        self.current.as_ref()
    }

    pub fn error(&self) -> Option<&ErrorStep> {
        self.error.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.feed.is_none()
    }

    /// Hand back the feed if the trace has not ended, so the caller can
    /// release the producer
    pub fn into_feed(self) -> Option<Box<dyn SnapshotFeed>> {
        self.feed
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let width = self.session.context_width();
        let window = match &self.current {
            Some(step) => self.session.source().window(step.line, step.column, width),
            None => Vec::new(),
        };

        let source_height = source_pane_height(width);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(source_height),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(frame.area());

        render_source_pane(
            frame,
            chunks[0],
            SourceRenderData {
                window: &window,
                file_name: &self.file_name,
                is_error: self.error.is_some(),
            },
        );

        render_stack_pane(
            frame,
            chunks[1],
            self.current.as_ref().map(|step| &step.stack),
            &mut self.stack_scroll,
        );

        render_status_bar(
            frame,
            chunks[2],
            StatusRenderData {
                message: &self.status_message,
                step: self.session.steps(),
                changed: self
                    .current
                    .as_ref()
                    .map_or(0, |step| step.stack.changed_count()),
                is_finished: self.is_finished(),
                is_error: self.error.is_some(),
            },
        );
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Right | KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('n') => {
                self.step();
                self.stack_scroll.offset = 0;
            }
            KeyCode::Up => {
                self.stack_scroll.offset = self.stack_scroll.offset.saturating_sub(1);
            }
            KeyCode::Down => {
                self.stack_scroll.offset = self.stack_scroll.offset.saturating_add(1);
            }
            _ => {}
        }
    }
}

/// Rows needed for a context window of half-width `width`: 2w+1 lines, the
/// caret line and two borders
fn source_pane_height(width: usize) -> u16 {
    u16::try_from(width.saturating_mul(2).saturating_add(4)).unwrap_or(u16::MAX)
}
