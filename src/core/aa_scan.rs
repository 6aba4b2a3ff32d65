//! Subject scanning against a finalized lookup table
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/blast_aascan.c:48-131
//!
//! The scanner walks a subject with a rolling word index, checks the presence
//! vector first, and copies the stored query offsets into a caller-supplied
//! array. When the array cannot take the next cell's hits the scan stops and
//! records where it stopped, so the caller can drain the array and resume.

use crate::core::aa_lookup::LookupTable;
use crate::core::blast_lookup::{compute_index, compute_index_incremental};

/// NCBI BlastOffsetPair (query/subject offsets of one word hit)
/// Reference: ncbi-blast/c++/include/algo/blast/core/blast_def.h:141-150
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OffsetPair {
    pub q_off: u32,
    pub s_off: u32,
}

/// Minimum offset-pair array size used by callers that do not care.
/// Reference: blast_extend.h OFFSET_ARRAY_SIZE
pub const OFFSET_ARRAY_SIZE: usize = 4096;

/// Capacity for an offset-pair array that can always hold the largest cell.
///
/// Reference: blast_lookup.c GetOffsetArraySize
pub fn offset_array_size(table: &LookupTable, min_size: usize) -> usize {
    min_size.max(table.longest_chain()).max(1)
}

/// True once `start` is past the last word of `subject`
#[inline]
pub fn scan_finished(table: &LookupTable, subject: &[u8], start: usize) -> bool {
    start + table.word_size() > subject.len()
}

/// Scan `subject` from `*start` for word hits.
///
/// Returns the number of pairs written to the front of `pairs`. On return
/// `*start` is the first subject offset not yet scanned; it is past the last
/// word when the whole subject was processed (see `scan_finished`), and
/// otherwise marks where to resume after draining `pairs`.
///
/// Subject residues must be below `2^charsize`.
///
/// # Panics
///
/// If a single backbone cell holds more hits than `pairs.len()`; size the
/// array with `offset_array_size`.
///
/// Reference: blast_aascan.c s_BlastAaScanSubject
pub fn scan_subject(
    table: &LookupTable,
    subject: &[u8],
    start: &mut usize,
    pairs: &mut [OffsetPair],
) -> usize {
    let word_size = table.word_size();
    if scan_finished(table, subject, *start) {
        return 0;
    }

    let charsize = table.charsize();
    let mask = table.mask();
    let pv = table.pv();
    let array_size = pairs.len();
    let s_first = *start;
    let s_last = subject.len() - word_size;

    // [C] index = ComputeTableIndex(word_length - 1, lookup->charsize, s_first);
    let mut index = compute_index(&subject[s_first..s_first + word_size - 1], charsize);
    let mut totalhits = 0usize;

    for s in s_first..=s_last {
        index = compute_index_incremental(index, subject[s + word_size - 1], charsize, mask);

        if !pv.test(index) {
            continue;
        }

        let hits = table.hits(index);
        let numhits = hits.len();
        assert!(
            numhits <= array_size,
            "offset array of {} pairs cannot hold the {} hits of one cell",
            array_size,
            numhits
        );

        if numhits > array_size - totalhits {
            // Not enough room; resume from this subject offset next call.
            *start = s;
            return totalhits;
        }

        let s_off = s as u32;
        for (dest, &q_off) in pairs[totalhits..totalhits + numhits].iter_mut().zip(hits) {
            *dest = OffsetPair { q_off, s_off };
        }
        totalhits += numhits;
    }

    *start = s_last + 1;
    totalhits
}

/// Scan the whole subject, draining a bounded array as often as needed.
pub fn scan_all(table: &LookupTable, subject: &[u8], array_size: usize) -> Vec<OffsetPair> {
    let mut pairs = vec![OffsetPair::default(); offset_array_size(table, array_size)];
    let mut out = Vec::new();
    let mut start = 0usize;
    while !scan_finished(table, subject, start) {
        let n = scan_subject(table, subject, &mut start, &mut pairs);
        out.extend_from_slice(&pairs[..n]);
    }
    out
}
