//! Residue ranges handed between the redo engine and its data callbacks
//!
//! Reference: ncbi-blast/c++/src/algo/blast/composition_adjustment/compo_mode_condition.h
//!   BlastCompo_SequenceRange / BlastCompo_SequenceData / BlastCompo_MatchingSequence

use std::borrow::Cow;

use super::composition::AminoAcidComposition;

/// Half-open window [`begin`, `end`) inside one context (frame or strand)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SequenceRange {
    pub begin: i32,
    pub end: i32,
    pub context: i32,
}

impl SequenceRange {
    pub fn new(begin: i32, end: i32, context: i32) -> Self {
        debug_assert!(begin <= end);
        Self { begin, end, context }
    }

    #[inline]
    pub fn len(&self) -> usize {
        (self.end - self.begin).max(0) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.begin
    }
}

/// Residues of a range, either borrowed from the caller's buffer or owned.
///
/// The first byte is always a 0 sentinel so the residues can be walked
/// backwards one position past their start.
// [C] data = buffer + 1, with buffer[0] holding the sentinel and `buffer`
// freed only when the struct owns it. Cow carries the same distinction.
#[derive(Debug, Clone)]
pub struct SequenceData<'a> {
    data: Cow<'a, [u8]>,
}

impl<'a> SequenceData<'a> {
    /// Wrap a buffer that already starts with the sentinel
    pub fn borrowed(with_sentinel: &'a [u8]) -> Self {
        debug_assert!(!with_sentinel.is_empty() && with_sentinel[0] == 0);
        Self {
            data: Cow::Borrowed(with_sentinel),
        }
    }

    /// Owned copy of `residues` with a sentinel prepended
    pub fn from_residues(residues: &[u8]) -> SequenceData<'static> {
        let mut buf = Vec::with_capacity(residues.len() + 1);
        buf.push(0);
        buf.extend_from_slice(residues);
        SequenceData {
            data: Cow::Owned(buf),
        }
    }

    /// Residues without the sentinel
    #[inline]
    pub fn residues(&self) -> &[u8] {
        &self.data[1..]
    }

    #[inline]
    pub fn with_sentinel(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn owns_buffer(&self) -> bool {
        matches!(self.data, Cow::Owned(_))
    }

    /// Residues [`begin`, `end`). A prefix is borrowed since the existing
    /// sentinel still leads it; any other slice is copied behind a new one.
    pub fn slice(&self, begin: usize, end: usize) -> SequenceData<'_> {
        debug_assert!(begin <= end && end <= self.len());
        if begin == 0 {
            SequenceData {
                data: Cow::Borrowed(&self.data[..end + 1]),
            }
        } else {
            SequenceData::from_residues(&self.residues()[begin..end])
        }
    }
}

/// A database or in-memory subject as the redo engine sees it
#[derive(Debug, Clone)]
pub struct MatchingSequence<'a> {
    /// Ordinal of the subject in the search
    pub index: usize,
    pub length: usize,
    pub data: SequenceData<'a>,
}

impl<'a> MatchingSequence<'a> {
    pub fn new(index: usize, data: SequenceData<'a>) -> Self {
        Self {
            index,
            length: data.len(),
            data,
        }
    }
}

/// Per-query data the redo engine needs: where the query starts inside the
/// concatenated query buffer, its residues, composition and search space.
///
/// Reference: compo_mode_condition.h BlastCompo_QueryInfo
#[derive(Debug, Clone)]
pub struct QueryInfo<'a> {
    pub origin: usize,
    pub seq: SequenceData<'a>,
    pub composition: AminoAcidComposition,
    pub eff_search_space: f64,
}

impl<'a> QueryInfo<'a> {
    pub fn new(origin: usize, seq: SequenceData<'a>, eff_search_space: f64) -> Self {
        let composition = AminoAcidComposition::from_residues(seq.residues());
        Self {
            origin,
            seq,
            composition,
            eff_search_space,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_is_kept() {
        let data = SequenceData::from_residues(&[5, 6, 7]);
        assert_eq!(data.with_sentinel(), &[0, 5, 6, 7]);
        assert_eq!(data.residues(), &[5, 6, 7]);
        assert_eq!(data.len(), 3);
        assert!(data.owns_buffer());
    }

    #[test]
    fn test_prefix_slice_borrows() {
        let buf = [0u8, 1, 2, 3, 4];
        let data = SequenceData::borrowed(&buf);
        assert!(!data.owns_buffer());

        let prefix = data.slice(0, 2);
        assert!(!prefix.owns_buffer());
        assert_eq!(prefix.residues(), &[1, 2]);

        let inner = data.slice(1, 3);
        assert!(inner.owns_buffer());
        assert_eq!(inner.with_sentinel(), &[0, 2, 3]);
    }

    #[test]
    fn test_range_len() {
        let r = SequenceRange::new(10, 25, 0);
        assert_eq!(r.len(), 15);
        assert!(!r.is_empty());
        assert!(SequenceRange::new(4, 4, 1).is_empty());
    }
}
