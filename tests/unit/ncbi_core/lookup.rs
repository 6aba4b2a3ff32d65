//! Unit tests for core/aa_lookup

use blastcore::core::aa_lookup::{
    make_all_word_sequence, BackboneCell, LookupError, LookupOptions, LookupTableBuilder, HITS_ON_BACKBONE,
};
use blastcore::core::blast_lookup::{compute_index, MAX_INDEX_BITS};
use blastcore::utils::matrix::{encode_protein, ScoreMatrix};
use rustc_hash::FxHashSet;

use crate::helpers::protein_lookup;

fn exact_options() -> LookupOptions {
    LookupOptions::protein(0)
}

#[test]
fn test_hits_round_trip_through_inline_and_overflow_cells() {
    let mut builder = LookupTableBuilder::new(exact_options()).unwrap();
    let crowded = encode_protein(b"WWW");
    let sparse = encode_protein(b"ACD");
    for offset in 0..5u32 {
        builder.add_word_hit(&crowded, offset);
    }
    builder.add_word_hit(&sparse, 42);
    let table = builder.finalize().unwrap();

    let crowded_index = compute_index(&crowded, table.charsize()) & table.mask();
    let sparse_index = compute_index(&sparse, table.charsize()) & table.mask();

    assert_eq!(table.hits(crowded_index), &[0, 1, 2, 3, 4]);
    assert!(matches!(table.cell(crowded_index), BackboneCell::Overflow { len: 5, .. }));
    assert_eq!(table.hits(sparse_index), &[42]);
    assert!(matches!(table.cell(sparse_index), BackboneCell::Inline { len: 1, .. }));

    let stats = table.stats();
    assert_eq!(stats.occupied_slots, 2);
    assert_eq!(stats.overflow_slots, 1);
    assert_eq!(stats.total_entries, 6);
    assert_eq!(table.longest_chain(), 5);
    assert_eq!(table.overflow_len(), 5);
}

#[test]
fn test_cell_holding_exactly_backbone_capacity_stays_inline() {
    let mut builder = LookupTableBuilder::new(exact_options()).unwrap();
    let word = encode_protein(b"KKK");
    for offset in 0..HITS_ON_BACKBONE as u32 {
        builder.add_word_hit(&word, offset);
    }
    let table = builder.finalize().unwrap();
    let index = compute_index(&word, table.charsize()) & table.mask();
    assert!(matches!(table.cell(index), BackboneCell::Inline { .. }));
    assert_eq!(table.overflow_len(), 0);
}

#[test]
fn test_presence_vector_matches_cells() {
    let (_, table) = protein_lookup(&[b"MKTAYIAKQRQISFVKSHFSRQ", b"WCHKWMYC"], 11);
    assert_eq!(table.pv().len(), table.backbone_size());
    let mut occupied = 0;
    for index in 0..table.backbone_size() {
        let used = table.cell(index).num_used();
        assert_eq!(table.pv().test(index), used > 0, "slot {}", index);
        assert_eq!(table.hits(index).len(), used);
        if used > 0 {
            occupied += 1;
        }
    }
    assert_eq!(occupied, table.stats().occupied_slots);
    assert_eq!(table.pv().count_ones(), occupied);
}

#[test]
fn test_neighborhood_contains_each_word_and_only_scoring_neighbors() {
    let query = b"WCHKW";
    let (queries, table) = protein_lookup(&[query], 11);
    let matrix = ScoreMatrix::blosum62();
    let encoded = encode_protein(query);
    let origin = queries.origin(0) as u32;

    for index in 0..table.backbone_size() {
        for &q_off in table.hits(index) {
            let local = (q_off - origin) as usize;
            let query_word = &encoded[local..local + 3];
            // Recover the candidate word from its index
            let charsize = table.charsize();
            let candidate: Vec<u8> = (0..3)
                .map(|i| ((index >> (charsize * (2 - i))) & ((1 << charsize) - 1)) as u8)
                .collect();
            assert!(
                candidate == query_word || matrix.word_score(query_word, &candidate) >= 11,
                "word {:?} indexed for {:?}",
                candidate,
                query_word
            );
        }
    }

    // Every query word is present under its own key
    for local in 0..=encoded.len() - 3 {
        let word = &encoded[local..local + 3];
        let index = compute_index(word, table.charsize()) & table.mask();
        assert!(table.hits(index).contains(&(origin + local as u32)));
    }
}

#[test]
fn test_exact_table_skips_out_of_alphabet_words() {
    let mut builder = LookupTableBuilder::new(LookupOptions {
        alphabet_size: 4,
        word_size: 2,
        threshold: 0,
    })
    .unwrap();
    builder.index_query(&[0, 1, 9, 2, 3], &[(0, 4)], &ScoreMatrix::nucleotide(1, -3));
    assert_eq!(builder.stats().exact_matches, 2);
    assert_eq!(builder.stats().skipped_words, 2);
}

#[test]
fn test_all_word_sequence_is_complete() {
    let seq = make_all_word_sequence(4, 3);
    assert_eq!(seq.len(), 4usize.pow(3) + 2);
    let words: FxHashSet<&[u8]> = seq.windows(3).collect();
    assert_eq!(words.len(), 64);
    assert!(seq.iter().all(|&r| r < 4));
}

#[test]
fn test_builder_rejects_bad_geometry() {
    let too_small = LookupOptions {
        alphabet_size: 1,
        ..exact_options()
    };
    assert_eq!(LookupTableBuilder::new(too_small).err(), Some(LookupError::AlphabetTooSmall(1)));

    let empty = LookupOptions {
        word_size: 0,
        ..exact_options()
    };
    assert_eq!(LookupTableBuilder::new(empty).err(), Some(LookupError::EmptyWord));

    let wide = LookupOptions {
        word_size: 6,
        ..exact_options()
    };
    match LookupTableBuilder::new(wide) {
        Err(LookupError::IndexTooWide { max_bits, .. }) => assert_eq!(max_bits, MAX_INDEX_BITS),
        other => panic!("expected IndexTooWide, got {:?}", other.map(|_| ())),
    }
}
