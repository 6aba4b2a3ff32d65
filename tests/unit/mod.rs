//! Unit test infrastructure for blastcore
//!
//! Tests are organized by module:
//! - `ncbi_core/` - Lookup table construction, subject scanning, numeric helpers
//! - `composition/` - Heaps, Smith-Waterman and the redo engine
//! - `common/` - Diagnostics, query buffer and tabular output

pub mod common;
pub mod composition;
pub mod helpers;
pub mod ncbi_core;
