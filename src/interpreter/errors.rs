//! Error types for every phase of the interpreter
//!
//! This module defines [`Error`], the single error type returned by the public
//! API, and the per-phase detail enums:
//! - [`CheckError`]: static (type checking) failures
//! - [`RuntimeError`]: failures raised while executing
//!
//! Lexical and syntax errors come from [`crate::parser`] as [`LexError`] and
//! [`ParseError`]. All core errors carry the [`Loc`] of the offending
//! construct. Check errors are raised before anything executes; execution
//! errors keep the mutations made up to the failure.

use crate::parser::ast::{Loc, Type};
use crate::parser::lexer::LexError;
use crate::parser::parse::ParseError;
use thiserror::Error;

/// Any error surfaced by the interpreter
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("{0}")]
    Lex(#[from] LexError),

    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("{kind}")]
    Check { loc: Loc, kind: CheckError },

    #[error("{kind}")]
    Execution { loc: Loc, kind: RuntimeError },

    /// A stepping command was issued while nothing is suspended
    #[error("nothing is being executed; start an execution first")]
    NotSuspended,

    /// A new execution was started while another one is suspended
    #[error("an execution is in progress; continue or reset it first")]
    Busy,
}

impl Error {
    pub fn check(loc: Loc, kind: CheckError) -> Self {
        Error::Check { loc, kind }
    }

    pub fn execution(loc: Loc, kind: RuntimeError) -> Self {
        Error::Execution { loc, kind }
    }

    pub fn loc(&self) -> Option<Loc> {
        match self {
            Error::Lex(e) => Some(e.loc),
            Error::Parse(e) => Some(e.loc),
            Error::Check { loc, .. } | Error::Execution { loc, .. } => Some(*loc),
            Error::NotSuspended | Error::Busy => None,
        }
    }

    /// Category label used when displaying the error
    pub fn kind_name(&self) -> &'static str {
        match self {
            Error::Lex(_) => "Lexical error",
            Error::Parse(_) => "Syntax error",
            Error::Check { .. } => "Type error",
            Error::Execution { .. } => "Execution error",
            Error::NotSuspended | Error::Busy => "Session error",
        }
    }

    /// Lex, parse and check errors are detected before execution starts
    pub fn is_static(&self) -> bool {
        matches!(self, Error::Lex(_) | Error::Parse(_) | Error::Check { .. })
    }
}

/// Static errors found by the type checker
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CheckError {
    #[error("no such class: {name}")]
    ClassNotFound { name: String },

    #[error("class {class} has no field named '{field}'")]
    FieldNotFound { class: String, field: String },

    #[error("{owner} has no method named '{name}'")]
    MethodNotFound { owner: String, name: String },

    #[error("{callee} expects {expected} argument(s) but {found} were given")]
    ArityMismatch {
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error("{what} '{name}' is already declared")]
    Duplicate { what: &'static str, name: String },

    #[error("no variable named '{name}' is in scope")]
    UndeclaredVariable { name: String },

    #[error("type mismatch: expected {expected} but found {found} ({explanation})")]
    TypeMismatch {
        expected: String,
        found: Type,
        explanation: String,
    },

    #[error("cannot compare a value of type {left} with a value of type {right}")]
    IncomparableTypes { left: Type, right: Type },

    #[error("comparing a newly created object using '==' or '!=' is pointless: it is never equal to any existing object")]
    FreshObjectComparison,

    #[error("this expression cannot be assigned to: {reason}")]
    BadAssignmentTarget { reason: String },

    #[error("a method returning void does not produce a value")]
    VoidValue,

    #[error("not a statement: only assignments, increments, calls and object creations can be used as statements")]
    NotAStatement,

    #[error("return statements are only allowed inside a method")]
    ReturnOutsideMethod,

    #[error("this method must return a value of type {expected}")]
    MissingReturnValue { expected: Type },

    #[error("a void method cannot return a value")]
    UnexpectedReturnValue,

    #[error("invalid array creation: {reason}")]
    BadArrayCreation { reason: &'static str },

    #[error("expected an object but found a value of type {found}")]
    NotAnObject { found: Type },

    #[error("'this' can only be used inside a method or constructor of a class")]
    ThisOutsideClass,

    #[error("type {ty} cannot be used here: {reason}")]
    BadType { ty: String, reason: &'static str },
}

/// Errors raised while a checked program runs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RuntimeError {
    #[error("null dereference: the value of this expression is null")]
    NullDereference,

    #[error("index {index} is out of bounds for an array of length {length}")]
    IndexOutOfBounds { index: i32, length: usize },

    #[error("cannot create an array of negative length {length}")]
    NegativeArrayLength { length: i32 },

    #[error("cannot create an array of length {length}: at most {limit} elements are allowed")]
    ArrayTooLarge { length: i32, limit: usize },

    #[error("{operation} by zero")]
    DivisionByZero { operation: &'static str },

    #[error("assertion failed")]
    AssertionFailed,

    #[error("stack overflow: more than {limit} nested calls")]
    StackOverflow { limit: usize },

    #[error("too many loop iterations: more than {limit}")]
    TooManyIterations { limit: usize },

    #[error("missing return statement in method '{method}'")]
    MissingReturn { method: String },

    /// Evaluator invariant violated; indicates a bug rather than a user error
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl RuntimeError {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        RuntimeError::Internal {
            message: message.into(),
        }
    }
}
