//! Memory model of the interpreter
//!
//! This module provides the core memory abstractions:
//! - [`value`]: Runtime value representation (Int, Bool, Null, Ref, Void)
//! - [`stack`]: Call stack with frames, operand stacks and the scope arena
//! - [`heap`]: Class instances and arrays with display-only reachability
//!
//! References are plain [`value::ObjectId`]s into the heap, so values are `Copy`
//! and sharing an object between variables is visible through every alias.

pub mod heap;
pub mod stack;
pub mod value;
