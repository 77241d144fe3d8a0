pub mod access;
pub mod assign;
pub mod binary;
pub mod objects;
pub mod unary;

// Operator handlers are `impl Session` blocks; only the pure operator
// functions are free-standing
