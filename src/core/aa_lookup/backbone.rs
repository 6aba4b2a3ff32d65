//! Finalized (thick) lookup table
//!
//! Reference: ncbi-blast/c++/include/algo/blast/core/blast_aalookup.h
//!   AaLookupBackboneCell / BlastAaLookupTable

use super::LookupOptions;
use crate::core::blast_lookup::PresenceVector;

/// Hit lists up to this length live inside the backbone cell.
/// Reference: blast_aalookup.h AA_HITS_PER_CELL
pub const HITS_ON_BACKBONE: usize = 3;

/// One backbone slot after finalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackboneCell {
    #[default]
    Empty,
    Inline {
        len: u8,
        offsets: [u32; HITS_ON_BACKBONE],
    },
    /// `overflow[start..start + len]`
    Overflow { start: u32, len: u32 },
}

impl BackboneCell {
    #[inline(always)]
    pub fn num_used(&self) -> usize {
        match *self {
            BackboneCell::Empty => 0,
            BackboneCell::Inline { len, .. } => len as usize,
            BackboneCell::Overflow { len, .. } => len as usize,
        }
    }
}

/// Indexing and occupancy counters, kept per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupStats {
    /// Query words indexed under their own key
    pub exact_matches: usize,
    /// Neighbor words indexed for some query word
    pub neighbor_matches: usize,
    /// Query words skipped for containing out-of-alphabet residues
    pub skipped_words: usize,
    /// Non-empty backbone slots
    pub occupied_slots: usize,
    /// Slots whose hits were moved to the overflow array
    pub overflow_slots: usize,
    /// Total stored (word, offset) entries
    pub total_entries: usize,
    /// Largest number of hits in one slot
    pub longest_chain: usize,
}

impl LookupStats {
    pub fn print_summary(&self, options: &LookupOptions, backbone_size: usize) {
        eprintln!("\n=== Lookup Table Diagnostics ===");
        eprintln!(
            "Alphabet size: {}, word size: {}, threshold: {}",
            options.alphabet_size, options.word_size, options.threshold
        );
        eprintln!("Backbone size: {}", backbone_size);
        eprintln!("Exact words indexed: {}", self.exact_matches);
        eprintln!("Neighbor words indexed: {}", self.neighbor_matches);
        eprintln!("Skipped words (invalid residue): {}", self.skipped_words);
        eprintln!(
            "Occupied slots: {} ({:.2}%)",
            self.occupied_slots,
            if backbone_size > 0 {
                100.0 * self.occupied_slots as f64 / backbone_size as f64
            } else {
                0.0
            }
        );
        eprintln!("Overflow slots: {}", self.overflow_slots);
        eprintln!("Total entries: {}", self.total_entries);
        eprintln!("Longest chain: {}", self.longest_chain);
        eprintln!("================================\n");
    }
}

/// Immutable lookup table used for scanning. Safe to share across threads.
#[derive(Debug, Clone)]
pub struct LookupTable {
    pub(super) word_size: usize,
    pub(super) alphabet_size: usize,
    pub(super) threshold: i32,
    pub(super) charsize: usize,
    pub(super) mask: usize,
    pub(super) backbone: Vec<BackboneCell>,
    pub(super) overflow: Vec<u32>,
    pub(super) pv: PresenceVector,
    pub(super) stats: LookupStats,
}

impl LookupTable {
    #[inline]
    pub fn word_size(&self) -> usize {
        self.word_size
    }

    #[inline]
    pub fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    #[inline]
    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    #[inline]
    pub fn charsize(&self) -> usize {
        self.charsize
    }

    #[inline]
    pub fn mask(&self) -> usize {
        self.mask
    }

    #[inline]
    pub fn backbone_size(&self) -> usize {
        self.backbone.len()
    }

    #[inline]
    pub fn pv(&self) -> &PresenceVector {
        &self.pv
    }

    #[inline]
    pub fn cell(&self, index: usize) -> &BackboneCell {
        &self.backbone[index]
    }

    #[inline]
    pub fn overflow_len(&self) -> usize {
        self.overflow.len()
    }

    pub fn stats(&self) -> &LookupStats {
        &self.stats
    }

    pub fn longest_chain(&self) -> usize {
        self.stats.longest_chain
    }

    /// Query offsets stored under `index`, in insertion order
    #[inline(always)]
    pub fn hits(&self, index: usize) -> &[u32] {
        match &self.backbone[index] {
            BackboneCell::Empty => &[],
            BackboneCell::Inline { len, offsets } => &offsets[..*len as usize],
            BackboneCell::Overflow { start, len } => {
                let start = *start as usize;
                &self.overflow[start..start + *len as usize]
            }
        }
    }
}
