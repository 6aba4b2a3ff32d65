//! Thin (indexing-time) lookup table
//!
//! Reference: blast_lookup.c BlastLookupAddWordHit
//!            blast_aalookup.c BlastAaLookupIndexQuery, BlastAaLookupFinalize

use super::backbone::{BackboneCell, LookupStats, LookupTable, HITS_ON_BACKBONE};
use super::{LookupError, LookupOptions, THIN_SLOT_INITIAL_CAPACITY};
use crate::algorithm::common::diagnostics::diagnostics_enabled;
use crate::core::blast_lookup::{
    compute_backbone_size, compute_charsize, compute_index, compute_mask, PresenceVector,
    MAX_INDEX_BITS,
};
use crate::utils::matrix::ScoreMatrix;

/// Mutable lookup table used while indexing queries.
///
/// Each backbone slot owns a growable list of query offsets. An empty `Vec`
/// does not allocate, so untouched slots cost only the vector header.
pub struct LookupTableBuilder {
    pub(super) options: LookupOptions,
    pub(super) charsize: usize,
    pub(super) mask: usize,
    pub(super) thin: Vec<Vec<u32>>,
    pub(super) stats: LookupStats,
    /// Every possible word, built on first use when threshold > 0
    pub(super) neighbors: Option<Vec<u8>>,
}

impl LookupTableBuilder {
    /// Validate the geometry and allocate an empty backbone.
    ///
    /// Reference: blast_aalookup.c BlastAaLookupTableNew
    pub fn new(options: LookupOptions) -> Result<Self, LookupError> {
        if options.alphabet_size < 2 {
            return Err(LookupError::AlphabetTooSmall(options.alphabet_size));
        }
        if options.word_size == 0 {
            return Err(LookupError::EmptyWord);
        }
        let charsize = compute_charsize(options.alphabet_size);
        if charsize * options.word_size > MAX_INDEX_BITS {
            return Err(LookupError::IndexTooWide {
                charsize,
                word_size: options.word_size,
                max_bits: MAX_INDEX_BITS,
            });
        }

        let backbone_size = compute_backbone_size(options.word_size, charsize);
        let mut thin: Vec<Vec<u32>> = Vec::new();
        thin.try_reserve_exact(backbone_size)
            .map_err(|_| LookupError::OutOfMemory {
                what: "lookup backbone",
                entries: backbone_size,
            })?;
        thin.resize_with(backbone_size, Vec::new);

        Ok(Self {
            options,
            charsize,
            mask: compute_mask(options.word_size, charsize),
            thin,
            stats: LookupStats::default(),
            neighbors: None,
        })
    }

    pub fn options(&self) -> &LookupOptions {
        &self.options
    }

    pub fn charsize(&self) -> usize {
        self.charsize
    }

    pub fn mask(&self) -> usize {
        self.mask
    }

    pub fn backbone_size(&self) -> usize {
        self.thin.len()
    }

    /// Counters gathered so far
    pub fn stats(&self) -> &LookupStats {
        &self.stats
    }

    /// Record `query_offset` under the backbone slot of `word`.
    ///
    /// Reference: blast_lookup.c BlastLookupAddWordHit
    pub fn add_word_hit(&mut self, word: &[u8], query_offset: u32) {
        debug_assert_eq!(word.len(), self.options.word_size);
        let index = compute_index(word, self.charsize) & self.mask;
        let slot = &mut self.thin[index];
        if slot.capacity() == 0 {
            slot.reserve_exact(THIN_SLOT_INITIAL_CAPACITY);
        }
        // Vec growth doubles the capacity once the slot is full.
        slot.push(query_offset);
    }

    /// Index every word that starts inside one of `windows`.
    ///
    /// `query` is the concatenated query buffer and each window is an
    /// inclusive `(from, to)` residue range, so masked regions and multiple
    /// contexts are expressed by the window list. Offsets stored in the table
    /// are positions in `query`. Words containing a residue outside the
    /// alphabet are skipped.
    ///
    /// With threshold 0 only the exact word is indexed; otherwise every word
    /// scoring at least `threshold` against it (plus the word itself) is.
    ///
    /// Reference: blast_aalookup.c BlastAaLookupIndexQuery / s_AddWordHits
    pub fn index_query(&mut self, query: &[u8], windows: &[(usize, usize)], matrix: &ScoreMatrix) {
        let word_size = self.options.word_size;
        let alphabet_size = self.options.alphabet_size;

        for &(from, to) in windows {
            if to >= query.len() || from > to || to + 1 - from < word_size {
                continue;
            }
            let last_start = to + 1 - word_size;
            for offset in from..=last_start {
                let word = &query[offset..offset + word_size];
                if word.iter().any(|&r| r as usize >= alphabet_size) {
                    self.stats.skipped_words += 1;
                    continue;
                }
                if self.options.threshold == 0 {
                    self.add_word_hit(word, offset as u32);
                    self.stats.exact_matches += 1;
                } else {
                    self.add_neighboring_words(matrix, word, offset as u32);
                }
            }
        }
    }

    /// Convert to the immutable scanning representation.
    ///
    /// Hit lists of at most `HITS_ON_BACKBONE` entries are copied into the
    /// cell, longer ones into a contiguous run of the shared overflow array.
    /// The presence vector bit is set for every non-empty slot. Each thin
    /// list is dropped as soon as it has been copied.
    ///
    /// Reference: blast_aalookup.c BlastAaLookupFinalize
    pub fn finalize(self) -> Result<LookupTable, LookupError> {
        let LookupTableBuilder {
            options,
            charsize,
            mask,
            thin,
            mut stats,
            neighbors: _,
        } = self;

        let backbone_size = thin.len();
        let overflow_size: usize = thin
            .iter()
            .map(Vec::len)
            .filter(|&n| n > HITS_ON_BACKBONE)
            .sum();

        let mut backbone: Vec<BackboneCell> = Vec::new();
        backbone
            .try_reserve_exact(backbone_size)
            .map_err(|_| LookupError::OutOfMemory {
                what: "finalized backbone",
                entries: backbone_size,
            })?;
        let mut overflow: Vec<u32> = Vec::new();
        overflow
            .try_reserve_exact(overflow_size)
            .map_err(|_| LookupError::OutOfMemory {
                what: "overflow array",
                entries: overflow_size,
            })?;
        let mut pv = PresenceVector::new(backbone_size);

        for (index, hits) in thin.into_iter().enumerate() {
            let num_used = hits.len();
            let cell = match num_used {
                0 => BackboneCell::Empty,
                n if n <= HITS_ON_BACKBONE => {
                    let mut offsets = [0u32; HITS_ON_BACKBONE];
                    offsets[..n].copy_from_slice(&hits);
                    BackboneCell::Inline {
                        len: n as u8,
                        offsets,
                    }
                }
                n => {
                    let start = overflow.len();
                    overflow.extend_from_slice(&hits);
                    stats.overflow_slots += 1;
                    BackboneCell::Overflow {
                        start: start as u32,
                        len: n as u32,
                    }
                }
            };
            if num_used > 0 {
                pv.set(index);
                stats.occupied_slots += 1;
                stats.total_entries += num_used;
                stats.longest_chain = stats.longest_chain.max(num_used);
            }
            backbone.push(cell);
        }

        let table = LookupTable {
            word_size: options.word_size,
            alphabet_size: options.alphabet_size,
            threshold: options.threshold,
            charsize,
            mask,
            backbone,
            overflow,
            pv,
            stats,
        };

        if diagnostics_enabled() {
            table.stats().print_summary(&options, backbone_size);
        }

        Ok(table)
    }
}
