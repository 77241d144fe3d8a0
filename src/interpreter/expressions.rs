//! Expression evaluation
//!
//! [`Session::eval_expr`] schedules the operands of an expression left to
//! right, then a step point for the expression itself, then `Apply`, which
//! pops the operand values and pushes the result. Leaves (literals,
//! variables, `this`) have no operands, so their step point comes first.
//!
//! Assignment targets are split: `EvalTarget` evaluates the receiver of a
//! field target or the array and index of an element target before the
//! right-hand side; the store itself happens in `Apply`.
//!
//! `&&` and `||` evaluate their right operand only when the left one does not
//! decide the result.

use crate::interpreter::engine::{internal, Session, Task};
use crate::interpreter::errors::Error;
use crate::interpreter::ops::unary::unary_op;
use crate::memory::heap::HeapObject;
use crate::memory::value::Value;
use crate::parser::ast::{BinaryOp, Callee, Expr, ExprKind};
use std::rc::Rc;

impl Session {
    pub(crate) fn eval_expr(&mut self, expr: &Rc<Expr>) -> Result<(), Error> {
        let mut tasks = Vec::new();
        match &expr.kind {
            ExprKind::IntLiteral(_)
            | ExprKind::BoolLiteral(_)
            | ExprKind::NullLiteral
            | ExprKind::This
            | ExprKind::Variable(_) => {}

            ExprKind::Unary { operand, .. } => tasks.push(Task::Eval(Rc::clone(operand))),

            ExprKind::Binary { op, left, .. } if op.is_logical() => {
                self.schedule([
                    Task::Eval(Rc::clone(left)),
                    Task::ShortCircuit(Rc::clone(expr)),
                ]);
                return Ok(());
            }

            ExprKind::Binary { left, right, .. } => {
                tasks.push(Task::Eval(Rc::clone(left)));
                tasks.push(Task::Eval(Rc::clone(right)));
            }

            ExprKind::Assign { target, value, .. } => {
                tasks.push(Task::EvalTarget(Rc::clone(target)));
                tasks.push(Task::Eval(Rc::clone(value)));
            }

            ExprKind::IncDec { target, .. } => tasks.push(Task::EvalTarget(Rc::clone(target))),

            ExprKind::New { args, .. } => {
                tasks.extend(args.iter().map(|arg| Task::Eval(Rc::clone(arg))));
            }

            ExprKind::NewArray {
                length,
                initializer,
                ..
            } => {
                tasks.extend(length.iter().map(|len| Task::Eval(Rc::clone(len))));
                if let Some(elements) = initializer {
                    tasks.extend(elements.iter().map(|e| Task::Eval(Rc::clone(e))));
                }
            }

            ExprKind::Select { target, .. } => tasks.push(Task::Eval(Rc::clone(target))),

            ExprKind::Subscript { target, index } => {
                tasks.push(Task::Eval(Rc::clone(target)));
                tasks.push(Task::Eval(Rc::clone(index)));
            }

            ExprKind::Call { callee, args } => {
                if let Callee::Method { receiver, .. } = callee {
                    tasks.push(Task::Eval(Rc::clone(receiver)));
                }
                tasks.extend(args.iter().map(|arg| Task::Eval(Rc::clone(arg))));
            }
        }
        tasks.push(Task::step(expr.loc, expr.instr_loc));
        tasks.push(Task::Apply(Rc::clone(expr)));
        self.schedule_all(tasks);
        Ok(())
    }

    /// Evaluate the operands of an assignment target
    pub(crate) fn eval_target(&mut self, target: &Rc<Expr>) -> Result<(), Error> {
        match &target.kind {
            ExprKind::Variable(_) => {}
            ExprKind::Select { target: object, .. } => {
                self.schedule([Task::Eval(Rc::clone(object))]);
            }
            ExprKind::Subscript { target: array, index } => {
                self.schedule([Task::Eval(Rc::clone(array)), Task::Eval(Rc::clone(index))]);
            }
            _ => return Err(internal(target.loc, "expression is not assignable")),
        }
        Ok(())
    }

    /// Left operand of `&&`/`||` is on the operand stack
    pub(crate) fn short_circuit(&mut self, expr: &Rc<Expr>) -> Result<(), Error> {
        let ExprKind::Binary { op, right, .. } = &expr.kind else {
            return Err(internal(expr.loc, "short circuit on a non-binary expression"));
        };
        let left = self.pop_bool(expr.loc)?;
        let decided = match op {
            BinaryOp::And => !left,
            _ => left,
        };
        if decided {
            self.push_value(Value::Bool(left));
            self.schedule([Task::step(expr.loc, expr.instr_loc)]);
        } else {
            self.schedule([
                Task::Eval(Rc::clone(right)),
                Task::step(expr.loc, expr.instr_loc),
            ]);
        }
        Ok(())
    }

    /// Produce the value of an expression from its evaluated operands
    pub(crate) fn apply(&mut self, expr: &Rc<Expr>) -> Result<(), Error> {
        match &expr.kind {
            ExprKind::IntLiteral(n) => self.push_value(Value::Int(*n)),
            ExprKind::BoolLiteral(b) => self.push_value(Value::Bool(*b)),
            ExprKind::NullLiteral => self.push_value(Value::Null),
            ExprKind::This => {
                let this = self
                    .call_stack
                    .current_frame()
                    .and_then(|frame| frame.this)
                    .ok_or_else(|| internal(expr.loc, "'this' outside of an instance method"))?;
                self.push_value(Value::Ref(this));
            }
            ExprKind::Variable(name) => {
                let value = self.read_variable(expr, name)?;
                self.push_value(value);
            }
            ExprKind::Unary { op, .. } => {
                let operand = self.pop_value(expr.loc)?;
                let value = unary_op(*op, operand)
                    .ok_or_else(|| internal(expr.loc, "ill-typed unary operand"))?;
                self.push_value(value);
            }
            ExprKind::Binary { op, .. } => self.apply_binary(expr, *op)?,
            ExprKind::Assign { op, target, .. } => self.apply_assign(expr, *op, target)?,
            ExprKind::IncDec { op, prefix, target } => {
                self.apply_inc_dec(expr, *op, *prefix, target)?
            }
            ExprKind::New { .. } => self.apply_new(expr)?,
            ExprKind::NewArray { .. } => self.apply_new_array(expr)?,
            ExprKind::Select { target, field } => self.apply_select(expr, target, field)?,
            ExprKind::Subscript { target, index } => self.apply_subscript(target, index)?,
            ExprKind::Call { callee, args } => self.apply_call(expr, callee, args.len())?,
        }
        Ok(())
    }

    /// A local variable, or a field of `this` named without qualification
    fn read_variable(&self, expr: &Expr, name: &str) -> Result<Value, Error> {
        if let Some(binding) = self.call_stack.lookup(name) {
            return Ok(binding.value);
        }
        let this = self
            .call_stack
            .current_frame()
            .and_then(|frame| frame.this)
            .ok_or_else(|| internal(expr.loc, format!("undeclared variable '{}'", name)))?;
        match self.object(this, expr.loc)? {
            HeapObject::Instance { class, fields } => class
                .field(name)
                .and_then(|(slot, _)| fields.get(slot).copied())
                .ok_or_else(|| internal(expr.loc, format!("undeclared variable '{}'", name))),
            HeapObject::Array { .. } => Err(internal(expr.loc, "'this' is an array")),
        }
    }
}
