//! Field and array element access

use crate::interpreter::engine::{internal, Session};
use crate::interpreter::errors::{Error, RuntimeError};
use crate::memory::heap::HeapObject;
use crate::memory::value::{ObjectId, Value};
use crate::parser::ast::{Expr, Loc};

impl Session {
    /// `target.field` with the target on the operand stack. On arrays the only
    /// field is `length`.
    pub(crate) fn apply_select(&mut self, expr: &Expr, target: &Expr, field: &str) -> Result<(), Error> {
        let reference = self.pop_value(expr.loc)?;
        let object = self.dereference(reference, target.loc)?;
        let value = match self.object(object, expr.loc)? {
            HeapObject::Array { elements, .. } if field == "length" => {
                Value::Int(array_length(elements.len()))
            }
            HeapObject::Array { .. } => {
                return Err(internal(expr.loc, format!("arrays have no field '{}'", field)))
            }
            HeapObject::Instance { .. } => {
                let slot = self.field_slot(object, field, expr.loc)?;
                self.object(object, expr.loc)?.slots()[slot]
            }
        };
        self.push_value(value);
        Ok(())
    }

    /// `target[index]` with both operands on the operand stack
    pub(crate) fn apply_subscript(&mut self, target: &Expr, index: &Expr) -> Result<(), Error> {
        let position = self.pop_int(index.loc)?;
        let reference = self.pop_value(target.loc)?;
        let array = self.dereference(reference, target.loc)?;
        let index = self.element_index(array, position, index.loc)?;
        let value = self.object(array, target.loc)?.slots()[index];
        self.push_value(value);
        Ok(())
    }

    /// Slot of a named field in an instance
    pub(crate) fn field_slot(&self, object: ObjectId, field: &str, loc: Loc) -> Result<usize, Error> {
        match self.object(object, loc)? {
            HeapObject::Instance { class, fields } => class
                .field(field)
                .map(|(slot, _)| slot)
                .filter(|slot| *slot < fields.len())
                .ok_or_else(|| {
                    internal(loc, format!("class {} has no field '{}'", class.name(), field))
                }),
            HeapObject::Array { .. } => Err(internal(loc, "arrays have no assignable fields")),
        }
    }

    /// Bounds-checked element index; out of range is a runtime error at `loc`
    pub(crate) fn element_index(&self, array: ObjectId, index: i32, loc: Loc) -> Result<usize, Error> {
        let HeapObject::Array { elements, .. } = self.object(array, loc)? else {
            return Err(internal(loc, "indexing an instance"));
        };
        match usize::try_from(index) {
            Ok(i) if i < elements.len() => Ok(i),
            _ => Err(Error::execution(
                loc,
                RuntimeError::IndexOutOfBounds {
                    index,
                    length: elements.len(),
                },
            )),
        }
    }

    /// Shallow copy of an array as a new heap object
    pub(crate) fn clone_array(&mut self, array: ObjectId, loc: Loc) -> Result<ObjectId, Error> {
        let copy = match self.object(array, loc)? {
            object @ HeapObject::Array { .. } => object.clone(),
            HeapObject::Instance { .. } => return Err(internal(loc, "clone() of an instance")),
        };
        Ok(self.heap.allocate(copy))
    }
}

/// Array lengths never exceed `i32::MAX` since they are created from an `int`
fn array_length(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}
