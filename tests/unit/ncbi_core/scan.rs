//! Unit tests for core/aa_scan

use blastcore::core::aa_scan::{offset_array_size, scan_all, scan_finished, scan_subject, OffsetPair};
use blastcore::utils::matrix::encode_protein;

use crate::helpers::protein_lookup;

#[test]
fn test_exact_words_found_at_shifted_offsets() {
    let (queries, table) = protein_lookup(&[b"ACDEFGHIK"], 0);
    let subject = encode_protein(b"XXACDEFGHIKXX");
    let pairs = scan_all(&table, &subject, 64);

    assert_eq!(pairs.len(), 7);
    for (i, pair) in pairs.iter().enumerate() {
        let (query_index, q_off) = queries.locate(pair.q_off as usize).unwrap();
        assert_eq!(query_index, 0);
        assert_eq!(q_off, i);
        assert_eq!(pair.s_off as usize, i + 2);
    }
}

#[test]
fn test_resumed_scan_equals_single_pass() {
    let (_, table) = protein_lookup(&[b"MKTAYIAKQRQISFVKSHFSRQ", b"AKQRQISF"], 11);
    let subject = encode_protein(b"GGMKTAYIAKQRQISFVKSHGGGFSRQLEERAKQRQ");

    let big = scan_all(&table, &subject, 1 << 16);
    let size = offset_array_size(&table, 1);
    let mut pairs = vec![OffsetPair::default(); size];
    let mut start = 0;
    let mut resumed = Vec::new();
    let mut calls = 0;
    while !scan_finished(&table, &subject, start) {
        let before = start;
        let n = scan_subject(&table, &subject, &mut start, &mut pairs);
        resumed.extend_from_slice(&pairs[..n]);
        calls += 1;
        assert!(start > before || n > 0, "scan made no progress");
    }
    assert_eq!(resumed, big);
    assert!(calls > 1);
}

#[test]
fn test_offset_array_holds_longest_chain() {
    let (_, table) = protein_lookup(&[b"WWWWWWWWWW"], 0);
    // WWW occurs at eight query offsets
    assert_eq!(table.longest_chain(), 8);
    assert_eq!(offset_array_size(&table, 1), 8);
    assert_eq!(offset_array_size(&table, 4096), 4096);
}
