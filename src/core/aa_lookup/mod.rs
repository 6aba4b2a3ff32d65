//! Word lookup table (thin builder, finalized backbone, neighbor words)
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/blast_aalookup.c
//!            ncbi-blast/c++/src/algo/blast/core/blast_lookup.c
//!
//! Indexing happens on a `LookupTableBuilder`, which keeps one growable hit list
//! per backbone slot. `LookupTableBuilder::finalize` consumes the builder and
//! produces the immutable `LookupTable` used by the scanner: small hit lists sit
//! inline in the backbone cell, larger ones in one shared overflow array.

mod backbone;
mod builder;
mod neighbors;

use std::fmt;

pub use backbone::{BackboneCell, LookupStats, LookupTable, HITS_ON_BACKBONE};
pub use builder::LookupTableBuilder;
pub use neighbors::make_all_word_sequence;

/// Initial capacity of a slot's hit list in the builder
pub const THIN_SLOT_INITIAL_CAPACITY: usize = 8;

/// Construction parameters, fixed for the lifetime of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupOptions {
    /// Number of residue codes; every indexed residue must be below this
    pub alphabet_size: usize,
    /// Word length k
    pub word_size: usize,
    /// Neighborhood score threshold; 0 indexes exact words only
    pub threshold: i32,
}

impl LookupOptions {
    /// Protein defaults: NCBISTDAA alphabet, 3-letter words, threshold 11
    pub fn protein(threshold: i32) -> Self {
        Self {
            alphabet_size: crate::utils::matrix::BLASTAA_SIZE,
            word_size: 3,
            threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Alphabet with fewer than two letters
    AlphabetTooSmall(usize),
    /// Zero-length words
    EmptyWord,
    /// `charsize * word_size` does not fit the index
    IndexTooWide { charsize: usize, word_size: usize, max_bits: usize },
    /// Backbone or overflow allocation failed
    OutOfMemory { what: &'static str, entries: usize },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::AlphabetTooSmall(n) => {
                write!(f, "alphabet size {} is too small (need at least 2)", n)
            }
            LookupError::EmptyWord => write!(f, "word size must be at least 1"),
            LookupError::IndexTooWide {
                charsize,
                word_size,
                max_bits,
            } => write!(
                f,
                "word index needs {} bits ({} bits x {} letters), limit is {}",
                charsize * word_size,
                charsize,
                word_size,
                max_bits
            ),
            LookupError::OutOfMemory { what, entries } => {
                write!(f, "failed to allocate {} ({} entries)", what, entries)
            }
        }
    }
}

impl std::error::Error for LookupError {}
