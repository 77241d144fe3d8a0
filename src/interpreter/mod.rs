//! Checking and execution
//!
//! This module provides the core execution logic:
//! - [`type_system`]: Class table and type resolution
//! - [`checker`]: Static type checking of declarations, statements and expressions
//! - [`engine`]: The [`Session`] and its task machine
//! - [`stepping`]: Step points and the suspension predicate of each stepping command
//! - [`errors`]: Error types for every phase
//!
//! # Execution Model
//!
//! The evaluator walks the AST without recursing on the native stack: pending
//! work is an explicit task stack and intermediate values live on per-frame
//! operand stacks. Suspending is returning from the driver loop; resuming is
//! calling it again.

pub mod checker;
pub mod constants;
pub mod engine;
pub mod errors;
mod expressions;
mod jumps;
mod loops;
pub(crate) mod ops;
mod statements;
pub mod stepping;
pub mod type_system;

pub use engine::{Outcome, Session, SessionConfig};
pub use errors::{CheckError, Error, RuntimeError};
pub use stepping::{StepCommand, StepPoint};
