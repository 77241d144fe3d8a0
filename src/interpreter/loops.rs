//! Loop execution
//!
//! `for` loops are desugared by the parser, so `while` is the only loop form.
//! A loop is driven by `LoopTest` tasks that carry the iteration count:
//!
//! ```text
//! Exec(while)          → Eval(cond), LoopTest{0}
//! LoopTest{n}, true    → Exec(body), Eval(cond), LoopTest{n + 1}
//! LoopTest{n}, false   → (done)
//! ```
//!
//! Starting iteration `max_loop_iterations + 1` fails with
//! [`RuntimeError::TooManyIterations`], located at the loop keyword.

use crate::interpreter::engine::{internal, Session, Task};
use crate::interpreter::errors::{Error, RuntimeError};
use crate::parser::ast::{Expr, Stmt, StmtKind};
use std::rc::Rc;

impl Session {
    pub(crate) fn exec_while(&mut self, stmt: &Rc<Stmt>, cond: &Rc<Expr>) {
        self.schedule([
            Task::Eval(Rc::clone(cond)),
            Task::LoopTest {
                stmt: Rc::clone(stmt),
                iteration: 0,
            },
        ]);
    }

    pub(crate) fn loop_test(&mut self, stmt: &Rc<Stmt>, iteration: usize) -> Result<(), Error> {
        let StmtKind::While { cond, body } = &stmt.kind else {
            return Err(internal(stmt.loc, "loop test on a statement that is not a loop"));
        };
        if !self.pop_bool(cond.loc)? {
            return Ok(());
        }

        let limit = self.config.max_loop_iterations;
        if iteration >= limit {
            return Err(Error::execution(
                stmt.instr_loc,
                RuntimeError::TooManyIterations { limit },
            ));
        }
        self.schedule([
            Task::Exec(Rc::clone(body)),
            Task::Eval(Rc::clone(cond)),
            Task::LoopTest {
                stmt: Rc::clone(stmt),
                iteration: iteration + 1,
            },
        ]);
        Ok(())
    }
}
