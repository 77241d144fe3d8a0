//! Runtime value representation
//!
//! This module defines the [`Value`] enum, which represents all possible runtime values.
//! Values are tagged and small: objects and arrays live on the
//! [`Heap`](super::heap::Heap) and are referred to by [`ObjectId`].
//!
//! # Value Types
//!
//! - [`Value::Int`]: 32-bit signed integer with wraparound arithmetic
//! - [`Value::Bool`]: boolean
//! - [`Value::Null`]: the null reference
//! - [`Value::Ref`]: reference to a heap object
//! - [`Value::Void`]: result of a call to a `void` method

use crate::parser::ast::Type;
use std::fmt;

/// Identity of a heap object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Runtime values in the interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Value {
    Int(i32),
    Bool(bool),
    #[default]
    Null,
    Ref(ObjectId),
    Void,
}

impl Value {
    /// Default value of a variable, field or array element of type `ty`
    pub fn default_for(ty: &Type) -> Value {
        match ty {
            Type::Int => Value::Int(0),
            Type::Boolean => Value::Bool(false),
            Type::Void => Value::Void,
            Type::Null | Type::Class(_) | Type::Array(_) => Value::Null,
        }
    }

    /// Get the integer value, returns None if not an Int
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the boolean value, returns None if not a Bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Referenced object, if this is a non-null reference
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Ref(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            Value::Ref(id) => write!(f, "{}", id),
            Value::Void => write!(f, "void"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(Value::default_for(&Type::Int), Value::Int(0));
        assert_eq!(Value::default_for(&Type::Boolean), Value::Bool(false));
        assert_eq!(
            Value::default_for(&Type::Array(Box::new(Type::Int))),
            Value::Null
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::Ref(ObjectId(7)).to_string(), "#7");
        assert_eq!(Value::Null.to_string(), "null");
    }
}
