//! Unary operator evaluation

use crate::interpreter::engine::{internal, Session};
use crate::interpreter::errors::Error;
use crate::memory::value::Value;
use crate::parser::ast::{Expr, IncDecOp, UnaryOp};

/// Apply a unary operator; `None` if the operand has the wrong kind
pub(crate) fn unary_op(op: UnaryOp, operand: Value) -> Option<Value> {
    match (op, operand) {
        (UnaryOp::Neg, Value::Int(n)) => Some(Value::Int(n.wrapping_neg())),
        (UnaryOp::BitNot, Value::Int(n)) => Some(Value::Int(!n)),
        (UnaryOp::Not, Value::Bool(b)) => Some(Value::Bool(!b)),
        _ => None,
    }
}

impl Session {
    /// `++x`, `x--`, `a[i]++`, ... with the target's operands on the stack
    pub(crate) fn apply_inc_dec(
        &mut self,
        expr: &Expr,
        op: IncDecOp,
        prefix: bool,
        target: &Expr,
    ) -> Result<(), Error> {
        let place = self.pop_place(target)?;
        let old = self
            .read_place(&place, target.loc)?
            .as_int()
            .ok_or_else(|| internal(target.loc, "increment of a non-int value"))?;
        let new = match op {
            IncDecOp::Increment => old.wrapping_add(1),
            IncDecOp::Decrement => old.wrapping_sub(1),
        };
        self.write_place(&place, Value::Int(new), expr.loc)?;
        self.push_value(Value::Int(if prefix { new } else { old }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unary_operators() {
        assert_eq!(unary_op(UnaryOp::Neg, Value::Int(5)), Some(Value::Int(-5)));
        assert_eq!(
            unary_op(UnaryOp::Neg, Value::Int(i32::MIN)),
            Some(Value::Int(i32::MIN))
        );
        assert_eq!(unary_op(UnaryOp::BitNot, Value::Int(0)), Some(Value::Int(-1)));
        assert_eq!(unary_op(UnaryOp::Not, Value::Bool(true)), Some(Value::Bool(false)));
        assert_eq!(unary_op(UnaryOp::Not, Value::Int(1)), None);
    }
}
