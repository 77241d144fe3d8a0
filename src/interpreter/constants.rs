// Limits of the evaluator

/// Maximum number of simultaneously active method calls (the top-level frame excluded)
pub const MAX_CALL_DEPTH: usize = 100;

/// Maximum number of iterations of a single loop execution
pub const MAX_LOOP_ITERATIONS: usize = 1000;

/// Maximum number of elements of a single array
pub const MAX_ARRAY_LENGTH: usize = 1 << 20;

/// Title of the bottom frame holding the top-level variables
pub const TOPLEVEL_FRAME_TITLE: &str = "(toplevel)";
