//! Unit tests for core modules

pub mod lookup;
pub mod math;
pub mod scan;
