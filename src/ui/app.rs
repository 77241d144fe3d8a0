//! Main TUI application state and logic

use super::panes::{
    render_console_pane, render_heap_pane, render_source_pane, render_stack_pane,
    render_status_bar, ConsoleKind, ConsoleLine, HeapRenderData, HeapScrollState, RunState,
    SourceRenderData, SourceScrollState, StackRenderData, StackScrollState, StatusRenderData,
};
use crate::interpreter::{Error, Outcome, Session, StepCommand};
use crate::parser::ast::{DocId, Loc, Stmt};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use log::debug;
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::rc::Rc;
use std::time::Duration;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Stack,
    Heap,
    Console,
}

impl FocusedPane {
    /// Move focus to the next pane (clockwise: source -> console -> stack -> heap)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Console,
            FocusedPane::Console => FocusedPane::Stack,
            FocusedPane::Stack => FocusedPane::Heap,
            FocusedPane::Heap => FocusedPane::Source,
        }
    }

    /// Move focus to the previous pane (counter-clockwise)
    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Heap,
            FocusedPane::Console => FocusedPane::Source,
            FocusedPane::Stack => FocusedPane::Console,
            FocusedPane::Heap => FocusedPane::Stack,
        }
    }
}

/// The main application state
pub struct App {
    /// The interpreter session
    pub session: Session,

    /// Document shown in the source pane
    pub doc: DocId,

    /// Top-level statements being debugged, replayed on reset
    pub statements: Vec<Rc<Stmt>>,

    /// Currently focused pane
    pub focused_pane: FocusedPane,

    pub source_scroll: SourceScrollState,
    pub stack_scroll: StackScrollState,
    pub heap_scroll: HeapScrollState,
    pub console_scroll: usize,

    pub console: Vec<ConsoleLine>,

    /// Number of stepping commands since the last (re)start
    pub steps: usize,

    /// Location of the error that ended the execution, if any
    pub error_loc: Option<Loc>,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,
}

impl App {
    /// Create the app and start executing `statements`, suspended at the first line
    pub fn new(session: Session, doc: DocId, statements: Vec<Rc<Stmt>>) -> Self {
        let mut app = App {
            session,
            doc,
            statements,
            focused_pane: FocusedPane::Source,
            source_scroll: SourceScrollState {
                offset: 0,
                target_line_row: None, // Will be set to center on first render
            },
            stack_scroll: StackScrollState {
                offset: 0,
                prev_item_count: 0,
            },
            heap_scroll: HeapScrollState {
                offset: 0,
                prev_item_count: 0,
            },
            console_scroll: 0,
            console: Vec::new(),
            steps: 0,
            error_loc: None,
            should_quit: false,
            status_message: String::from("Ready!"),
        };
        app.start();
        app
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
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

    /// Current execution state for the status bar
    pub fn run_state(&self) -> RunState {
        if self.error_loc.is_some() {
            RunState::Error
        } else if self.session.is_suspended() {
            RunState::Suspended
        } else {
            RunState::Done
        }
    }

    fn start(&mut self) {
        self.steps = 0;
        self.error_loc = None;
        let result = self
            .session
            .start_statements(&self.statements, StepCommand::Step);
        self.finish_command(result);
        if self.error_loc.is_none() {
            self.status_message = "Started".to_string();
        }
    }

    /// Issue a stepping command against the suspended execution
    pub fn command(&mut self, command: StepCommand) {
        if !self.session.is_suspended() {
            self.status_message = "Nothing to step; press r to restart".to_string();
            return;
        }
        debug!("ui command {:?}", command);
        let result = match command {
            StepCommand::SmallStep => self.session.small_step(),
            StepCommand::Step => self.session.step(),
            StepCommand::StepOver => self.session.step_over(),
            StepCommand::StepOut => self.session.step_out(),
            StepCommand::Continue => self.session.resume(),
        };
        self.steps += 1;
        self.status_message = format!("{:?}", command);
        self.finish_command(result);
    }

    /// Reset the session and start the statements again
    pub fn restart(&mut self) {
        self.session.reset();
        self.console.push(ConsoleLine {
            kind: ConsoleKind::Info,
            text: "-- reset --".to_string(),
        });
        self.start();
    }

    fn finish_command(&mut self, result: Result<Outcome, Error>) {
        match result {
            Ok(Outcome::Suspended(_)) => {}
            Ok(Outcome::Completed(_)) => {
                self.console.push(ConsoleLine {
                    kind: ConsoleKind::Info,
                    text: "Execution finished".to_string(),
                });
                for binding in self.session.call_stack().toplevel_bindings() {
                    self.console.push(ConsoleLine {
                        kind: ConsoleKind::Result,
                        text: format!(
                            "{}: {} = {}",
                            binding.name,
                            binding.ty,
                            self.session.render_value(binding.value)
                        ),
                    });
                }
                self.status_message = "Execution finished".to_string();
            }
            Err(error) => {
                self.error_loc = error.loc();
                let position = error
                    .loc()
                    .map(|loc| format!(" at {}", self.session.sources().describe(loc)))
                    .unwrap_or_default();
                self.console.push(ConsoleLine {
                    kind: ConsoleKind::Error,
                    text: format!("{}{}: {}", error.kind_name(), position, error),
                });
                self.status_message = error.to_string();
            }
        }
        self.session.collect_garbage();
        self.console_scroll = usize::MAX;
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // 4 panes in 2 columns, plus status bar at bottom
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(main_chunks[0]);

        // Left column: Source (top) | Console (bottom)
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(columns[0]);

        // Right column: Stack (top) | Heap (bottom)
        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[1]);

        let instruction = self.session.suspended_at().map(|point| point.instr_loc);
        if let Some(document) = self.session.sources().get(self.doc) {
            render_source_pane(
                frame,
                left_rows[0],
                SourceRenderData {
                    document,
                    instruction,
                    error: self.error_loc,
                },
                self.focused_pane == FocusedPane::Source,
                &mut self.source_scroll,
            );
        }

        render_console_pane(
            frame,
            left_rows[1],
            &self.console,
            self.focused_pane == FocusedPane::Console,
            &mut self.console_scroll,
        );

        render_stack_pane(
            frame,
            right_rows[0],
            StackRenderData {
                call_stack: self.session.call_stack(),
                heap: self.session.heap(),
                sources: self.session.sources(),
                last_result: self.session.last_result(),
            },
            self.focused_pane == FocusedPane::Stack,
            &mut self.stack_scroll,
        );

        render_heap_pane(
            frame,
            right_rows[1],
            HeapRenderData {
                heap: self.session.heap(),
            },
            self.focused_pane == FocusedPane::Heap,
            &mut self.heap_scroll,
        );

        let position = self
            .session
            .suspended_at()
            .map(|point| self.session.sources().line_col(point.instr_loc));
        render_status_bar(
            frame,
            main_chunks[1],
            StatusRenderData {
                message: &self.status_message,
                state: self.run_state(),
                steps: self.steps,
                position,
            },
        );
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('i') => self.command(StepCommand::SmallStep),
            KeyCode::Char('s') | KeyCode::Right => self.command(StepCommand::Step),
            KeyCode::Char('o') => self.command(StepCommand::StepOver),
            KeyCode::Char('u') => self.command(StepCommand::StepOut),
            KeyCode::Char('c') => self.command(StepCommand::Continue),
            KeyCode::Char('r') => self.restart(),
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.prev();
            }
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Source => {
                    // Scrolling up makes the current line move down visually
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_add(1));
                    }
                }
                FocusedPane::Stack => {
                    self.stack_scroll.offset = self.stack_scroll.offset.saturating_sub(1);
                }
                FocusedPane::Heap => {
                    self.heap_scroll.offset = self.heap_scroll.offset.saturating_sub(1);
                }
                FocusedPane::Console => {
                    self.console_scroll = self.console_scroll.saturating_sub(1);
                }
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Source => {
                    // Scrolling down makes the current line move up visually
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_sub(1));
                    }
                }
                FocusedPane::Stack => {
                    self.stack_scroll.offset = self.stack_scroll.offset.saturating_add(1);
                }
                FocusedPane::Heap => {
                    self.heap_scroll.offset = self.heap_scroll.offset.saturating_add(1);
                }
                FocusedPane::Console => {
                    self.console_scroll = self.console_scroll.saturating_add(1);
                }
            },
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::SessionConfig;

    fn app_for(source: &str) -> App {
        let mut session = Session::new(SessionConfig::default());
        let doc = session.add_document("test.java", source);
        let statements = session.load_script(doc).expect("script should load");
        App::new(session, doc, statements)
    }

    #[test]
    fn test_focus_cycle() {
        let mut pane = FocusedPane::Source;
        for _ in 0..4 {
            pane = pane.next();
        }
        assert_eq!(pane, FocusedPane::Source);
        assert_eq!(FocusedPane::Source.next().prev(), FocusedPane::Source);
    }

    #[test]
    fn test_commands_until_done() {
        let mut app = app_for("int x = 1;\nx = x + 1;\n");
        assert_eq!(app.run_state(), RunState::Suspended);
        app.command(StepCommand::Continue);
        assert_eq!(app.run_state(), RunState::Done);
        assert!(app
            .console
            .iter()
            .any(|line| line.kind == ConsoleKind::Result && line.text == "x: int = 2"));

        app.restart();
        assert_eq!(app.run_state(), RunState::Suspended);
        assert_eq!(app.steps, 0);
    }

    #[test]
    fn test_error_state() {
        let mut app = app_for("int x = 0;\nint y = 1 / x;\n");
        app.command(StepCommand::Continue);
        assert_eq!(app.run_state(), RunState::Error);
        assert!(app.error_loc.is_some());
        assert_eq!(
            app.console.last().map(|line| line.kind),
            Some(ConsoleKind::Error)
        );
    }
}
