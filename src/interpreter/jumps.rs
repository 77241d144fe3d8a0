//! Method returns
//!
//! Returning unwinds the task stack down to the [`Task::CallBoundary`] pushed
//! when the method was invoked, pops the frame (and with it every scope of the
//! method) and pushes the result on the caller's operand stack. Nothing left
//! behind the boundary runs.

use crate::interpreter::engine::{internal, Session, Task};
use crate::interpreter::errors::{Error, RuntimeError};
use crate::interpreter::type_system::return_type;
use crate::memory::value::Value;
use crate::parser::ast::{Loc, Stmt, Type};
use log::trace;

impl Session {
    /// `return;` or `return value;` with the value on the operand stack
    pub(crate) fn finish_return(&mut self, stmt: &Stmt, has_value: bool) -> Result<(), Error> {
        let value = if has_value {
            self.pop_value(stmt.loc)?
        } else {
            Value::Void
        };
        self.return_from_call(value, stmt.loc)
    }

    /// Control reached the closing brace of a method body
    pub(crate) fn finish_implicit_return(&mut self, stmt: &Stmt) -> Result<(), Error> {
        let frame = self
            .call_stack
            .current_frame()
            .ok_or_else(|| internal(stmt.loc, "implicit return without a frame"))?;
        let returns_value = frame
            .method
            .as_ref()
            .is_some_and(|method| return_type(method) != Type::Void);
        if returns_value {
            return Err(Error::execution(
                stmt.loc,
                RuntimeError::MissingReturn {
                    method: frame.title.clone(),
                },
            ));
        }
        self.return_from_call(Value::Void, stmt.loc)
    }

    fn return_from_call(&mut self, value: Value, loc: Loc) -> Result<(), Error> {
        if self.call_stack.depth() <= 1 {
            return Err(internal(loc, "return outside of a method"));
        }
        loop {
            match self.tasks.pop() {
                Some(Task::CallBoundary) => break,
                Some(_) => continue,
                None => return Err(internal(loc, "call boundary missing")),
            }
        }
        if let Some(frame) = self.call_stack.pop_frame() {
            trace!("return from {} with {}", frame.title, value);
        }
        self.push_value(value);
        Ok(())
    }
}
