//! Stepping controller
//!
//! Execution passes a step point right before every evaluable node produces
//! its value, and before the effect of declarations, `return`, `assert` and the
//! implicit return at a closing brace. At each point the session asks the
//! current [`StepMode`] whether to suspend.
//!
//! A mode captures the [`Position`] execution was suspended at when the
//! command was issued; the predicate compares it with the position of the
//! next step point:
//!
//! | Mode        | Suspends when                                                  |
//! |-------------|----------------------------------------------------------------|
//! | `SmallStep` | always                                                         |
//! | `Step`      | the frame or depth changed, or the line changed                |
//! | `StepOver`  | never deeper; always shallower or in another frame; else on a new line |
//! | `StepOut`   | the depth dropped, or the same depth holds another frame       |
//! | `Continue`  | never                                                          |

use crate::memory::stack::FrameId;
use crate::parser::ast::{DocId, Loc};

/// Where execution is suspended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPoint {
    /// Full extent of the node
    pub loc: Loc,
    /// Range to highlight
    pub instr_loc: Loc,
}

impl StepPoint {
    pub fn new(loc: Loc, instr_loc: Loc) -> Self {
        StepPoint { loc, instr_loc }
    }
}

/// Call stack shape and source line of a step point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub depth: usize,
    pub frame: FrameId,
    /// `None` before the first suspension of an execution
    pub line: Option<(DocId, usize)>,
}

/// A stepping command issued by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepCommand {
    SmallStep,
    Step,
    StepOver,
    StepOut,
    Continue,
}

/// A stepping command together with the position it was issued at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    SmallStep,
    Step(Position),
    StepOver(Position),
    StepOut(Position),
    Continue,
}

impl StepMode {
    pub fn capture(command: StepCommand, at: Position) -> Self {
        match command {
            StepCommand::SmallStep => StepMode::SmallStep,
            StepCommand::Step => StepMode::Step(at),
            StepCommand::StepOver => StepMode::StepOver(at),
            StepCommand::StepOut => StepMode::StepOut(at),
            StepCommand::Continue => StepMode::Continue,
        }
    }

    /// Whether execution should suspend at a step point at `now`
    pub fn should_suspend(&self, now: &Position) -> bool {
        match self {
            StepMode::SmallStep => true,
            StepMode::Step(captured) => {
                now.depth != captured.depth
                    || now.frame != captured.frame
                    || now.line != captured.line
            }
            StepMode::StepOver(captured) => {
                if now.depth > captured.depth {
                    false
                } else if now.depth < captured.depth || now.frame != captured.frame {
                    true
                } else {
                    now.line != captured.line
                }
            }
            StepMode::StepOut(captured) => {
                now.depth < captured.depth
                    || (now.depth == captured.depth && now.frame != captured.frame)
            }
            StepMode::Continue => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(depth: usize, frame: u64, line: usize) -> Position {
        Position {
            depth,
            frame: FrameId(frame),
            line: Some((DocId(0), line)),
        }
    }

    #[test]
    fn test_step_waits_for_new_line() {
        let mode = StepMode::capture(StepCommand::Step, at(1, 1, 3));
        assert!(!mode.should_suspend(&at(1, 1, 3)));
        assert!(mode.should_suspend(&at(1, 1, 4)));
        assert!(mode.should_suspend(&at(2, 2, 3)));
    }

    #[test]
    fn test_step_from_start_suspends_immediately() {
        let start = Position {
            depth: 1,
            frame: FrameId(1),
            line: None,
        };
        assert!(StepMode::Step(start).should_suspend(&at(1, 1, 0)));
        assert!(StepMode::StepOver(start).should_suspend(&at(1, 1, 0)));
        assert!(!StepMode::StepOut(start).should_suspend(&at(1, 1, 0)));
    }

    #[test]
    fn test_step_over_skips_callees() {
        let mode = StepMode::capture(StepCommand::StepOver, at(2, 5, 10));
        assert!(!mode.should_suspend(&at(3, 6, 2)));
        assert!(!mode.should_suspend(&at(2, 5, 10)));
        assert!(mode.should_suspend(&at(2, 5, 11)));
        assert!(mode.should_suspend(&at(1, 1, 10)));
        // Recursive call replaced by a sibling call at the same depth
        assert!(mode.should_suspend(&at(2, 7, 10)));
    }

    #[test]
    fn test_step_out_waits_for_caller() {
        let mode = StepMode::capture(StepCommand::StepOut, at(3, 9, 4));
        assert!(!mode.should_suspend(&at(3, 9, 5)));
        assert!(!mode.should_suspend(&at(4, 10, 1)));
        assert!(mode.should_suspend(&at(2, 8, 12)));
        assert!(mode.should_suspend(&at(3, 11, 4)));
    }

    #[test]
    fn test_small_step_and_continue() {
        assert!(StepMode::SmallStep.should_suspend(&at(1, 1, 1)));
        assert!(!StepMode::Continue.should_suspend(&at(1, 1, 1)));
    }
}
