//! Unit tests for algorithm/common/queries.rs

use blastcore::algorithm::common::queries::{encode_with_sentinel, QuerySet};
use blastcore::utils::matrix::encode_protein;

use crate::helpers::protein_records;

#[test]
fn test_empty_query_has_no_window() {
    let set = QuerySet::from_records(&protein_records(&[b"ACDEF", b"", b"GHIK"]));
    assert_eq!(set.len(), 3);
    assert_eq!(set.query_len(1), 0);
    assert_eq!(set.windows().len(), 2);
    assert_eq!(set.total_residues(), 9);
    // Two adjacent sentinels surround the empty query
    assert_eq!(set.buffer()[6], 0);
    assert_eq!(set.buffer()[7], 0);
}

#[test]
fn test_locate_every_residue() {
    let seqs: [&[u8]; 3] = [b"MKT", b"AYIAK", b"W"];
    let set = QuerySet::from_records(&protein_records(&seqs));
    for (qi, seq) in seqs.iter().enumerate() {
        for local in 0..seq.len() {
            assert_eq!(set.locate(set.origin(qi) + local), Some((qi, local)));
        }
        assert_eq!(set.residues(qi), &encode_protein(seq)[..]);
    }
    assert_eq!(set.locate(set.buffer().len()), None);
}

#[test]
fn test_encode_with_sentinel() {
    let buf = encode_with_sentinel(b"ACD");
    assert_eq!(buf[0], 0);
    assert_eq!(&buf[1..], &encode_protein(b"ACD")[..]);
}
