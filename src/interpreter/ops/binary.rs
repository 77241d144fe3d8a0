//! Binary operator evaluation
//!
//! Integer arithmetic wraps at 32 bits. Division and remainder truncate toward
//! zero; a zero divisor is an execution error, and `i32::MIN / -1` wraps to
//! `i32::MIN` (remainder `0`). Shift counts are masked to their low five bits
//! and `>>>` shifts in zeros.

use crate::interpreter::engine::{internal, Session};
use crate::interpreter::errors::{Error, RuntimeError};
use crate::memory::value::Value;
use crate::parser::ast::{BinaryOp, Expr, Loc};

/// Apply a non-short-circuit binary operator to two values
pub(crate) fn binary_op(op: BinaryOp, left: Value, right: Value, loc: Loc) -> Result<Value, Error> {
    use BinaryOp::*;

    let value = match (op, left, right) {
        (Eq, l, r) => Value::Bool(l == r),
        (Ne, l, r) => Value::Bool(l != r),

        (BitAnd, Value::Bool(l), Value::Bool(r)) => Value::Bool(l & r),
        (BitOr, Value::Bool(l), Value::Bool(r)) => Value::Bool(l | r),
        (BitXor, Value::Bool(l), Value::Bool(r)) => Value::Bool(l ^ r),

        (op, Value::Int(l), Value::Int(r)) => match op {
            Add => Value::Int(l.wrapping_add(r)),
            Sub => Value::Int(l.wrapping_sub(r)),
            Mul => Value::Int(l.wrapping_mul(r)),
            Div => Value::Int(checked_divisor(r, "division", loc).map(|r| l.wrapping_div(r))?),
            Mod => Value::Int(checked_divisor(r, "remainder", loc).map(|r| l.wrapping_rem(r))?),
            BitAnd => Value::Int(l & r),
            BitOr => Value::Int(l | r),
            BitXor => Value::Int(l ^ r),
            Shl => Value::Int(l.wrapping_shl(r as u32)),
            Shr => Value::Int(l.wrapping_shr(r as u32)),
            UShr => Value::Int((l as u32).wrapping_shr(r as u32) as i32),
            Lt => Value::Bool(l < r),
            Le => Value::Bool(l <= r),
            Gt => Value::Bool(l > r),
            Ge => Value::Bool(l >= r),
            Eq | Ne | And | Or => return Err(internal(loc, "unexpected integer operator")),
        },

        (op, _, _) => {
            return Err(internal(
                loc,
                format!("ill-typed operands for '{}'", op.symbol()),
            ))
        }
    };
    Ok(value)
}

fn checked_divisor(divisor: i32, operation: &'static str, loc: Loc) -> Result<i32, Error> {
    if divisor == 0 {
        return Err(Error::execution(loc, RuntimeError::DivisionByZero { operation }));
    }
    Ok(divisor)
}

impl Session {
    /// Both operands are on the operand stack
    pub(crate) fn apply_binary(&mut self, expr: &Expr, op: BinaryOp) -> Result<(), Error> {
        let right = self.pop_value(expr.loc)?;
        let left = self.pop_value(expr.loc)?;
        let value = binary_op(op, left, right, expr.instr_loc)?;
        self.push_value(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::value::ObjectId;

    fn int(op: BinaryOp, l: i32, r: i32) -> Value {
        binary_op(op, Value::Int(l), Value::Int(r), Loc::default()).unwrap()
    }

    #[test]
    fn test_wrapping_arithmetic() {
        assert_eq!(int(BinaryOp::Add, i32::MAX, 1), Value::Int(i32::MIN));
        assert_eq!(int(BinaryOp::Sub, i32::MIN, 1), Value::Int(i32::MAX));
        assert_eq!(int(BinaryOp::Mul, 65536, 65536), Value::Int(0));
    }

    #[test]
    fn test_division_truncates_toward_zero() {
        assert_eq!(int(BinaryOp::Div, -7, 2), Value::Int(-3));
        assert_eq!(int(BinaryOp::Mod, -7, 2), Value::Int(-1));
        assert_eq!(int(BinaryOp::Mod, 7, -2), Value::Int(1));
        assert_eq!(int(BinaryOp::Div, i32::MIN, -1), Value::Int(i32::MIN));
        assert_eq!(int(BinaryOp::Mod, i32::MIN, -1), Value::Int(0));
    }

    #[test]
    fn test_division_by_zero() {
        let err = binary_op(BinaryOp::Div, Value::Int(1), Value::Int(0), Loc::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::Execution {
                kind: RuntimeError::DivisionByZero { operation: "division" },
                ..
            }
        ));
        let err = binary_op(BinaryOp::Mod, Value::Int(1), Value::Int(0), Loc::default()).unwrap_err();
        assert_eq!(err.to_string(), "remainder by zero");
    }

    #[test]
    fn test_shifts() {
        assert_eq!(int(BinaryOp::Shl, 1, 33), Value::Int(2));
        assert_eq!(int(BinaryOp::Shr, -8, 1), Value::Int(-4));
        assert_eq!(int(BinaryOp::UShr, -1, 28), Value::Int(15));
    }

    #[test]
    fn test_reference_equality() {
        let a = Value::Ref(ObjectId(1));
        let b = Value::Ref(ObjectId(2));
        let eq = |l, r| binary_op(BinaryOp::Eq, l, r, Loc::default()).unwrap();
        assert_eq!(eq(a, a), Value::Bool(true));
        assert_eq!(eq(a, b), Value::Bool(false));
        assert_eq!(eq(a, Value::Null), Value::Bool(false));
        assert_eq!(eq(Value::Null, Value::Null), Value::Bool(true));
    }

    #[test]
    fn test_boolean_logical_operators() {
        let op = |op, l, r| binary_op(op, Value::Bool(l), Value::Bool(r), Loc::default()).unwrap();
        assert_eq!(op(BinaryOp::BitAnd, true, false), Value::Bool(false));
        assert_eq!(op(BinaryOp::BitOr, true, false), Value::Bool(true));
        assert_eq!(op(BinaryOp::BitXor, true, true), Value::Bool(false));
    }
}
