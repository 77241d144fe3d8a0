//! Assignment and storage locations
//!
//! A [`Place`] is a resolved assignment target. It is built from the target's
//! operands once the right-hand side has been evaluated, so a null receiver or
//! an out-of-bounds index is reported after the right-hand side ran.

use crate::interpreter::engine::{internal, Session};
use crate::interpreter::errors::{Error, RuntimeError};
use crate::interpreter::ops::binary::binary_op;
use crate::memory::heap::HeapObject;
use crate::memory::value::{ObjectId, Value};
use crate::parser::ast::{BinaryOp, Expr, ExprKind, Loc};

/// A storage location
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Place {
    /// Local variable of the current frame
    Local(String),
    /// Field slot of an instance
    Field { object: ObjectId, slot: usize },
    /// Element of an array
    Element { array: ObjectId, index: usize },
}

impl Session {
    /// `target = value` or `target op= value`, with the target's operands and
    /// the value on the operand stack
    pub(crate) fn apply_assign(
        &mut self,
        expr: &Expr,
        op: Option<BinaryOp>,
        target: &Expr,
    ) -> Result<(), Error> {
        let value = self.pop_value(expr.loc)?;
        let place = self.pop_place(target)?;
        let stored = match op {
            None => value,
            Some(op) => {
                let current = self.read_place(&place, target.loc)?;
                binary_op(op, current, value, expr.instr_loc)?
            }
        };
        self.write_place(&place, stored, expr.loc)?;
        self.push_value(stored);
        Ok(())
    }

    /// Resolve an assignment target, popping the operands `EvalTarget` pushed
    pub(crate) fn pop_place(&mut self, target: &Expr) -> Result<Place, Error> {
        match &target.kind {
            ExprKind::Variable(name) => {
                if self.call_stack.lookup(name).is_some() {
                    return Ok(Place::Local(name.clone()));
                }
                let this = self
                    .call_stack
                    .current_frame()
                    .and_then(|frame| frame.this)
                    .ok_or_else(|| internal(target.loc, format!("undeclared variable '{}'", name)))?;
                let slot = self.field_slot(this, name, target.loc)?;
                Ok(Place::Field { object: this, slot })
            }

            ExprKind::Select {
                target: receiver,
                field,
            } => {
                let object = self.pop_value(target.loc)?;
                let object = self.dereference(object, receiver.loc)?;
                let slot = self.field_slot(object, field, target.loc)?;
                Ok(Place::Field { object, slot })
            }

            ExprKind::Subscript {
                target: array,
                index,
            } => {
                let position = self.pop_int(index.loc)?;
                let reference = self.pop_value(target.loc)?;
                let array = self.dereference(reference, array.loc)?;
                let index = self.element_index(array, position, index.loc)?;
                Ok(Place::Element { array, index })
            }

            _ => Err(internal(target.loc, "expression is not assignable")),
        }
    }

    pub(crate) fn read_place(&self, place: &Place, loc: Loc) -> Result<Value, Error> {
        match place {
            Place::Local(name) => self
                .call_stack
                .lookup(name)
                .map(|binding| binding.value)
                .ok_or_else(|| internal(loc, format!("variable '{}' went out of scope", name))),
            Place::Field { object, slot } => self.slot(*object, *slot, loc),
            Place::Element { array, index } => self.slot(*array, *index, loc),
        }
    }

    pub(crate) fn write_place(&mut self, place: &Place, value: Value, loc: Loc) -> Result<(), Error> {
        match place {
            Place::Local(name) => {
                let binding = self
                    .call_stack
                    .lookup_mut(name)
                    .ok_or_else(|| internal(loc, format!("variable '{}' went out of scope", name)))?;
                binding.value = value;
            }
            Place::Field { object, slot } => {
                let HeapObject::Instance { fields, .. } = self.object_mut(*object, loc)? else {
                    return Err(internal(loc, "field store into an array"));
                };
                let field = fields
                    .get_mut(*slot)
                    .ok_or_else(|| internal(loc, "field slot out of range"))?;
                *field = value;
            }
            Place::Element { array, index } => {
                let HeapObject::Array { elements, .. } = self.object_mut(*array, loc)? else {
                    return Err(internal(loc, "element store into an instance"));
                };
                let element = elements
                    .get_mut(*index)
                    .ok_or_else(|| internal(loc, "element index out of range"))?;
                *element = value;
            }
        }
        Ok(())
    }

    /// The object a reference points to; null is a runtime error at `loc`
    pub(crate) fn dereference(&self, value: Value, loc: Loc) -> Result<ObjectId, Error> {
        match value {
            Value::Ref(id) => Ok(id),
            Value::Null => Err(Error::execution(loc, RuntimeError::NullDereference)),
            other => Err(internal(loc, format!("{} is not a reference", other))),
        }
    }

    fn slot(&self, object: ObjectId, slot: usize, loc: Loc) -> Result<Value, Error> {
        self.object(object, loc)?
            .slots()
            .get(slot)
            .copied()
            .ok_or_else(|| internal(loc, "slot out of range"))
    }
}
