//! Test utilities shared by the unit tests
//!
//! - FASTA record fixtures
//! - Lookup tables built the way the pipelines build them
//! - Redo inputs for one protein query against one subject

use bio::io::fasta::Record;
use blastcore::algorithm::common::queries::{build_lookup, QuerySet};
use blastcore::composition_adjustment::{
    Alignment, AlignmentList, MatchingSequence, MatrixAdjustRule, QueryInfo, SequenceData,
};
use blastcore::core::aa_lookup::{LookupOptions, LookupTable};
use blastcore::utils::matrix::{encode_protein, ScoreMatrix};

/// Query used across the redo tests
pub const REDO_QUERY: &[u8] = b"MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQ";
/// Same protein with a three-residue insertion and flanking prolines
pub const REDO_SUBJECT: &[u8] = b"PPPPMKTAYIAKQRQISFVKSHGGGFSRQLEERLGLIEVQPPPP";

/// Records named q1, q2, ... in order
pub fn protein_records(seqs: &[&[u8]]) -> Vec<Record> {
    seqs.iter()
        .enumerate()
        .map(|(i, seq)| Record::with_attrs(&format!("q{}", i + 1), None, seq))
        .collect()
}

/// BLOSUM62 lookup table for `seqs` at `threshold`
pub fn protein_lookup(seqs: &[&[u8]], threshold: i32) -> (QuerySet, LookupTable) {
    let queries = QuerySet::from_records(&protein_records(seqs));
    let table = build_lookup(&queries, LookupOptions::protein(threshold), &ScoreMatrix::blosum62()).unwrap();
    (queries, table)
}

/// Encoded residues with the leading sentinel `SequenceData::borrowed` expects
pub fn with_sentinel(seq: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8];
    buf.extend(encode_protein(seq));
    buf
}

/// One query, one subject, and a seed covering the first half of their match
pub struct RedoFixture {
    pub query: Vec<u8>,
    pub subject: Vec<u8>,
}

impl RedoFixture {
    pub fn new() -> Self {
        Self {
            query: with_sentinel(REDO_QUERY),
            subject: with_sentinel(REDO_SUBJECT),
        }
    }

    pub fn queries(&self, eff_search_space: f64) -> Vec<QueryInfo<'_>> {
        vec![QueryInfo::new(1, SequenceData::borrowed(&self.query), eff_search_space)]
    }

    pub fn matching(&self) -> MatchingSequence<'_> {
        MatchingSequence::new(0, SequenceData::borrowed(&self.subject))
    }

    pub fn seed<T>(&self) -> AlignmentList<T> {
        vec![Alignment::new(80, MatrixAdjustRule::DontAdjust, 0, 0, 18, 4, 22, 0, None)].into_iter().collect()
    }
}

impl Default for RedoFixture {
    fn default() -> Self {
        Self::new()
    }
}
