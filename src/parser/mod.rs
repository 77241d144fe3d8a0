//! Source parser
//!
//! This module transforms source text into an Abstract Syntax Tree (AST):
//! - [`source_map`]: Documents and offset → line/column mapping
//! - [`lexer`]: On-demand scanning (source text → tokens)
//! - [`parse`]: Parser state, helpers and entry points
//! - [`ast`]: AST node definitions
//!
//! # Supported Language
//!
//! A pedagogical subset of Java:
//! - Types: `int`, `boolean`, `void` (return type only), classes, arrays
//! - Declarations: classes with fields, one optional constructor and methods;
//!   top-level methods
//! - Statements: declarations with initializer, assignments, `if`, `while`,
//!   `for`, `return`, `assert`, blocks
//! - No inheritance, interfaces, generics, statics, strings or exceptions
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser, one method per precedence level.
//! No external parser generator dependencies.

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
pub mod source_map;
mod statements;

pub use parse::{
    parse_declarations, parse_expression, parse_script, parse_statements, Parser, ParserOptions,
};
