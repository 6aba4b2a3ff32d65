//! Unit tests for common modules

pub mod diagnostics;
pub mod output;
pub mod queries;
