//! Heap Layout Type Definitions
//!
//! This crate contains the core type definitions for the layout schema.
//! It provides pure data structures for describing heap object layouts
//! without any file I/O or code generation logic.

pub mod types;

// Re-export commonly used types at the crate root
pub use types::*;
