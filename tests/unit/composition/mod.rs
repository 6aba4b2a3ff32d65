//! Unit tests for composition_adjustment

pub mod heap;
pub mod redo;
pub mod smith_waterman;
