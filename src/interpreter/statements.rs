//! Statement execution
//!
//! Executing a statement schedules the evaluation of its expressions followed
//! by a continuation:
//!
//! - declaration: `Eval(init)`, step point, `Finish` binds the variable
//! - expression statement: `Eval(expr)`, `Discard`
//! - block: opens a scope, runs its statements, then `ExitScope`
//! - `if`: `Eval(cond)`, `Branch`
//! - `assert`: `Eval(cond)`, step point, `Finish` checks the value
//!
//! Loops live in [`super::loops`]; `return` and the implicit return at a
//! closing brace in [`super::jumps`].

use crate::interpreter::engine::{internal, Session, Task};
use crate::interpreter::errors::{Error, RuntimeError};
use crate::memory::stack::LocalBinding;
use crate::parser::ast::{Stmt, StmtKind};
use std::rc::Rc;

impl Session {
    pub(crate) fn exec_stmt(&mut self, stmt: &Rc<Stmt>) -> Result<(), Error> {
        match &stmt.kind {
            StmtKind::VarDecl { init, .. } => self.schedule([
                Task::Eval(Rc::clone(init)),
                Task::step(stmt.loc, stmt.instr_loc),
                Task::Finish(Rc::clone(stmt)),
            ]),

            StmtKind::Expr(expr) => self.schedule([Task::Eval(Rc::clone(expr)), Task::Discard]),

            StmtKind::Return(Some(value)) => self.schedule([
                Task::Eval(Rc::clone(value)),
                Task::step(stmt.loc, stmt.instr_loc),
                Task::Finish(Rc::clone(stmt)),
            ]),

            StmtKind::Return(None) | StmtKind::ImplicitReturn => self.schedule([
                Task::step(stmt.loc, stmt.instr_loc),
                Task::Finish(Rc::clone(stmt)),
            ]),

            StmtKind::Block(statements) => {
                let restore = self
                    .call_stack
                    .enter_scope()
                    .ok_or_else(|| internal(stmt.loc, "no frame to open a scope in"))?;
                let mut tasks: Vec<Task> = statements
                    .iter()
                    .map(|s| Task::Exec(Rc::clone(s)))
                    .collect();
                tasks.push(Task::ExitScope(restore));
                self.schedule_all(tasks);
            }

            StmtKind::If { cond, .. } => {
                self.schedule([Task::Eval(Rc::clone(cond)), Task::Branch(Rc::clone(stmt))])
            }

            StmtKind::While { cond, .. } => self.exec_while(stmt, cond),

            StmtKind::Assert(cond) => self.schedule([
                Task::Eval(Rc::clone(cond)),
                Task::step(stmt.loc, stmt.instr_loc),
                Task::Finish(Rc::clone(stmt)),
            ]),
        }
        Ok(())
    }

    /// Complete a statement once its operands are on the operand stack
    pub(crate) fn finish_stmt(&mut self, stmt: &Rc<Stmt>) -> Result<(), Error> {
        match &stmt.kind {
            StmtKind::VarDecl {
                ty, name, name_loc, ..
            } => {
                let value = self.pop_value(stmt.loc)?;
                let ty = ty
                    .resolved()
                    .cloned()
                    .ok_or_else(|| internal(stmt.loc, "declaration was not type checked"))?;
                let declared = self.call_stack.declare(LocalBinding {
                    name: name.clone(),
                    ty,
                    value,
                    decl_loc: *name_loc,
                });
                if !declared {
                    return Err(internal(
                        *name_loc,
                        format!("variable '{}' declared twice in one scope", name),
                    ));
                }
                Ok(())
            }

            StmtKind::Assert(cond) => {
                if !self.pop_bool(cond.loc)? {
                    return Err(Error::execution(cond.loc, RuntimeError::AssertionFailed));
                }
                Ok(())
            }

            StmtKind::Return(value) => self.finish_return(stmt, value.is_some()),

            StmtKind::ImplicitReturn => self.finish_implicit_return(stmt),

            _ => Err(internal(stmt.loc, "statement has no continuation")),
        }
    }

    /// Run the chosen branch of an `if` whose condition is on the operand stack
    pub(crate) fn branch(&mut self, stmt: &Rc<Stmt>) -> Result<(), Error> {
        let StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } = &stmt.kind
        else {
            return Err(internal(stmt.loc, "branch on a statement that is not an if"));
        };
        if self.pop_bool(cond.loc)? {
            self.schedule([Task::Exec(Rc::clone(then_branch))]);
        } else if let Some(else_branch) = else_branch {
            self.schedule([Task::Exec(Rc::clone(else_branch))]);
        }
        Ok(())
    }
}
