//! Common Lookup Table Infrastructure
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/blast_lookup.c
//!            ncbi-blast/c++/include/algo/blast/core/blast_lookup.h
//!
//! Word index arithmetic and the presence vector shared by the lookup table
//! builder and the subject scanner.

// Presence vector layout: 64-bit buckets
pub const PV_ARRAY_BTS: usize = 6;
pub const PV_ARRAY_MASK: usize = 63;
pub const PV_BUCKET_BITS: usize = 64;

/// Upper bound on `charsize * word_size`. Keeps the backbone addressable and
/// the rolling index inside a `usize` on every supported target.
pub const MAX_INDEX_BITS: usize = 24;

/// Calculate the size of a presence vector array for a given backbone size
#[inline]
pub fn pv_array_size(backbone_size: usize) -> usize {
    (backbone_size + PV_BUCKET_BITS - 1) / PV_BUCKET_BITS
}

/// One bit per backbone slot, set iff the slot holds at least one hit.
///
/// The scanner tests this before touching the backbone cell, which is usually
/// cold in cache.
#[derive(Debug, Clone)]
pub struct PresenceVector {
    bits: Vec<u64>,
    len: usize,
}

impl PresenceVector {
    pub fn new(len: usize) -> Self {
        Self {
            bits: vec![0; pv_array_size(len)],
            len,
        }
    }

    /// Number of addressable slots
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn set(&mut self, index: usize) {
        debug_assert!(index < self.len);
        self.bits[index >> PV_ARRAY_BTS] |= 1u64 << (index & PV_ARRAY_MASK);
    }

    #[inline(always)]
    pub fn test(&self, index: usize) -> bool {
        (self.bits[index >> PV_ARRAY_BTS] & (1u64 << (index & PV_ARRAY_MASK))) != 0
    }

    /// Number of set bits
    pub fn count_ones(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }
}

/// Bits needed per residue: ceil(log2(alphabet_size)).
#[inline]
pub fn compute_charsize(alphabet_size: usize) -> usize {
    let mut bits = 0usize;
    while (1usize << bits) < alphabet_size {
        bits += 1;
    }
    bits
}

/// Number of backbone cells: 2^(charsize * word_size)
#[inline]
pub fn compute_backbone_size(word_size: usize, charsize: usize) -> usize {
    1usize << (charsize * word_size)
}

/// Mask selecting the low `word_size * charsize` bits of a rolling index
#[inline]
pub fn compute_mask(word_size: usize, charsize: usize) -> usize {
    compute_backbone_size(word_size, charsize) - 1
}

/// Index of a whole word, read as a base-2^charsize number.
///
/// Reference: blast_lookup.h ComputeTableIndex
#[inline]
pub fn compute_index(word: &[u8], charsize: usize) -> usize {
    word.iter()
        .fold(0usize, |index, &residue| (index << charsize) | residue as usize)
}

/// Slide a rolling index one residue to the right.
///
/// Reference: blast_lookup.h ComputeTableIndexIncremental
#[inline(always)]
pub fn compute_index_incremental(index: usize, residue: u8, charsize: usize, mask: usize) -> usize {
    ((index << charsize) | residue as usize) & mask
}
