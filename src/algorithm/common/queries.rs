//! FASTA input and the concatenated protein query buffer
//!
//! Queries are packed into one buffer separated by 0 sentinels, the layout
//! the lookup table indexes: `[0, q0..., 0, q1..., 0]`. Offsets reported by
//! the scanner are positions in this buffer.

use anyhow::{Context, Result};
use bio::io::fasta;
use std::path::Path;

use crate::core::aa_lookup::{LookupOptions, LookupTable, LookupTableBuilder};
use crate::utils::matrix::{encode_protein, ScoreMatrix};

/// Read every record of a FASTA file
pub fn read_fasta(path: &Path) -> Result<Vec<fasta::Record>> {
    let reader = fasta::Reader::from_file(path).with_context(|| format!("Failed to open FASTA file {}", path.display()))?;
    reader
        .records()
        .map(|r| r.with_context(|| format!("Malformed FASTA record in {}", path.display())))
        .collect()
}

/// First word of the record's ID line
pub fn record_id(record: &fasta::Record) -> String {
    record.id().split_whitespace().next().unwrap_or("unknown").to_string()
}

/// Encode a subject with a leading sentinel, ready for `SequenceData::borrowed`
pub fn encode_with_sentinel(seq: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(seq.len() + 1);
    buf.push(0);
    buf.extend(encode_protein(seq));
    buf
}

/// Protein queries in NCBISTDAA, concatenated
#[derive(Debug, Clone, Default)]
pub struct QuerySet {
    pub ids: Vec<String>,
    buffer: Vec<u8>,
    origins: Vec<usize>,
    lengths: Vec<usize>,
}

impl QuerySet {
    pub fn from_records(records: &[fasta::Record]) -> Self {
        let mut set = QuerySet {
            buffer: vec![0],
            ..QuerySet::default()
        };
        for record in records {
            let encoded = encode_protein(record.seq());
            set.ids.push(record_id(record));
            set.origins.push(set.buffer.len());
            set.lengths.push(encoded.len());
            set.buffer.extend_from_slice(&encoded);
            set.buffer.push(0);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn origin(&self, query_index: usize) -> usize {
        self.origins[query_index]
    }

    pub fn query_len(&self, query_index: usize) -> usize {
        self.lengths[query_index]
    }

    pub fn residues(&self, query_index: usize) -> &[u8] {
        let origin = self.origins[query_index];
        &self.buffer[origin..origin + self.lengths[query_index]]
    }

    /// Residues preceded by the separator sentinel
    pub fn with_sentinel(&self, query_index: usize) -> &[u8] {
        let origin = self.origins[query_index];
        &self.buffer[origin - 1..origin + self.lengths[query_index]]
    }

    /// Inclusive (from, to) window of each non-empty query in the buffer
    pub fn windows(&self) -> Vec<(usize, usize)> {
        self.origins
            .iter()
            .zip(&self.lengths)
            .filter(|(_, &len)| len > 0)
            .map(|(&origin, &len)| (origin, origin + len - 1))
            .collect()
    }

    /// Map a buffer offset to (query index, offset within that query)
    pub fn locate(&self, offset: usize) -> Option<(usize, usize)> {
        let idx = self.origins.partition_point(|&o| o <= offset).checked_sub(1)?;
        let local = offset - self.origins[idx];
        (local < self.lengths[idx]).then_some((idx, local))
    }

    pub fn total_residues(&self) -> usize {
        self.lengths.iter().sum()
    }
}

/// Index all queries and finalize the table
pub fn build_lookup(queries: &QuerySet, options: LookupOptions, matrix: &ScoreMatrix) -> Result<LookupTable> {
    let mut builder = LookupTableBuilder::new(options).context("Invalid lookup table geometry")?;
    builder.index_query(queries.buffer(), &queries.windows(), matrix);
    let table = builder.finalize().context("Failed to finalize lookup table")?;
    Ok(table)
}
