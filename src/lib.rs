//! # Introduction
//!
//! jstepper parses, checks and executes a small teaching subset of Java one
//! step at a time. Execution can be suspended at every evaluation step and
//! resumed with debugger-style commands, while the call stack and the heap
//! stay inspectable. A terminal UI built with
//! [ratatui](https://docs.rs/ratatui) shows them side by side with the source.
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Scanner → Parser → AST → Checker → Session (task machine) → TUI
//! ```
//!
//! 1. [`parser`]: scans the source on demand and builds an AST.
//! 2. [`interpreter`]: checks declarations and statements statically, then
//!    executes them in a [`Session`] that can suspend at step points.
//! 3. [`memory`]: values, the call stack with its scopes and operand stacks,
//!    and the heap of objects and arrays.
//! 4. [`ui`]: ratatui-based TUI; not part of the stable library API.
//!
//! ## Supported subset
//!
//! Types: `int`, `boolean`, classes, arrays (`void` as a return type).
//! Control flow: `if/else`, `while`, `for`, `return`, `assert`.
//! Classes have fields, at most one constructor and instance methods; methods
//! may also be declared at the top level.

pub mod interpreter;
pub mod memory;
pub mod parser;
pub mod ui;

pub use interpreter::{Error, Outcome, Session, SessionConfig, StepCommand};
