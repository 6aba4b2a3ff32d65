pub mod algorithm;
pub mod common;
pub mod utils;

pub mod align;
pub mod composition_adjustment;
pub mod stats;

// NCBI-style core modules (lookup table, scanning, math)
pub mod core;
