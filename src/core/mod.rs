//! BLAST Core Algorithms
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/
//!
//! Lookup table construction and subject scanning for protein words, plus
//! the numeric helpers they and the statistics code share.
//!
//! - **Lookup Tables** (`blast_lookup`, `aa_lookup`)
//!   - Presence vector and backbone geometry
//!   - Neighborhood word indexing and compression into thick cells
//!
//! - **Scanning** (`aa_scan`)
//!   - Resumable subject scan into a bounded offset-pair buffer
//!
//! - **Math** (`ncbi_math`)
//!   - expm1/log1p, factorials, log-gamma, Romberg integration, rounding

// Lookup Tables
pub mod aa_lookup;
pub mod blast_lookup;

// Scanning
pub mod aa_scan;

// Math
pub mod ncbi_math;
