//! Unit tests for composition_adjustment/smith_waterman.rs

use blastcore::composition_adjustment::{smith_waterman_find_start, smith_waterman_score_only, ForbiddenRanges};
use blastcore::utils::matrix::{encode_protein, ScoreMatrix};

#[test]
fn test_fully_forbidden_band_blocks_only_diagonal_moves() {
    let matrix = ScoreMatrix::blosum62();
    let q = encode_protein(b"WCHKWMYC");
    let mut forbidden = ForbiddenRanges::new(q.len());
    forbidden.push(0, q.len(), 0, q.len());

    let end = smith_waterman_score_only(&matrix, &q, &q, 11, 1, &forbidden);
    assert_eq!(end.score, 0);
    assert_eq!(smith_waterman_find_start(&matrix, &q, &q, 11, 1, &end, &forbidden), None);
}

#[test]
fn test_scaled_matrix_scales_score() {
    let matrix = ScoreMatrix::blosum62();
    let scaled = matrix.scaled(32.0);
    let q = encode_protein(b"GGGWCHKWMYCGGG");
    let s = encode_protein(b"PPPPPWCHKWMYCPP");
    let forbidden = ForbiddenRanges::new(q.len());

    let plain = smith_waterman_score_only(&matrix, &q, &s, 11, 1, &forbidden);
    let big = smith_waterman_score_only(&scaled, &q, &s, 352, 32, &forbidden);
    assert_eq!(big.score, plain.score * 32);
    assert_eq!((big.query_end, big.match_end), (plain.query_end, plain.match_end));
}
