//! TUI pane rendering modules
//!
//! This module provides the rendering logic for all visual panes in the TUI,
//! organized by responsibility.
//!
//! # Pane Modules
//!
//! - [`source`]: Source code with syntax highlighting and the current range
//! - [`stack`]: Call frames with their variables and pending operands
//! - [`heap`]: Reachable objects with their contents
//! - [`console`]: Results and errors reported by the session
//! - [`status`]: Status bar with keybindings and execution state
//! - `utils`: Shared value formatting
//!
//! Each pane module exports a primary `render_*` function together with its
//! scroll state and render data types.

mod utils;

pub mod console;
pub mod heap;
pub mod source;
pub mod stack;
pub mod status;

pub use console::{render_console_pane, ConsoleKind, ConsoleLine};
pub use heap::{render_heap_pane, HeapRenderData, HeapScrollState};
pub use source::{render_source_pane, SourceRenderData, SourceScrollState};
pub use stack::{render_stack_pane, StackRenderData, StackScrollState};
pub use status::{render_status_bar, RunState, StatusRenderData};
