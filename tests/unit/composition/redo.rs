//! Unit tests for composition_adjustment/redo_alignment.rs through the
//! protein callbacks

use blastcore::algorithm::common::diagnostics::RedoDiagnostics;
use blastcore::align::EditScript;
use blastcore::composition_adjustment::{
    protein_redo_params, redo_one_match, redo_one_match_smith_waterman, Alignment, AlignmentList, CompoAdjustMode,
    CompoHeap, CompositionWorkspace, ForbiddenRanges, HeapEntry, MatchingSequence, MatrixAdjustRule, MatrixInfo,
    ProteinRedo, QueryInfo, RedoAlignParams, SequenceData,
};
use blastcore::stats::tables::blosum62_gapped;
use std::sync::atomic::Ordering;

use crate::helpers::{with_sentinel, RedoFixture};

fn params(scale: f64, mode: CompoAdjustMode) -> RedoAlignParams<ProteinRedo> {
    let karlin = blosum62_gapped(11, 1).unwrap();
    protein_redo_params(MatrixInfo::blosum62(scale), 11, 1, 38, &karlin, 25, 10.0, mode)
}

fn count(counter: &std::sync::atomic::AtomicUsize) -> usize {
    counter.load(Ordering::Relaxed)
}

#[test]
fn test_second_seed_inside_redone_alignment_is_skipped() {
    let fixture = RedoFixture::new();
    let queries = fixture.queries(1e6);
    let subject = fixture.matching();
    // Newest first: the first-half seed is the oldest and is redone first
    let incoming: AlignmentList<EditScript> = vec![
        Alignment::new(70, MatrixAdjustRule::DontAdjust, 0, 18, 33, 25, 40, 0, None),
        Alignment::new(80, MatrixAdjustRule::DontAdjust, 0, 0, 18, 4, 22, 0, None),
    ]
    .into_iter()
    .collect();

    let p = params(1.0, CompoAdjustMode::NoAdjustment);
    let mut ws = CompositionWorkspace::new(&p.matrix_info);
    let diag = RedoDiagnostics::default();
    let out = redo_one_match(&p, &mut ws, &incoming, &subject, &queries, Some(&diag)).unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].len(), 1);
    let a = out[0].iter().next().unwrap();
    assert_eq!(a.score, 146);
    assert_eq!((a.match_start, a.match_end), (4, 40));
    assert_eq!(count(&diag.windows), 1);
    assert_eq!(count(&diag.alignments_redone), 1);
    assert_eq!(count(&diag.candidates_contained), 1);
}

#[test]
fn test_composition_adjustment_rescales_matrix() {
    let fixture = RedoFixture::new();
    let queries = fixture.queries(1e6);
    let subject = fixture.matching();
    let incoming: AlignmentList<EditScript> = fixture.seed();

    let p = params(32.0, CompoAdjustMode::CompositionBasedStats);
    let mut ws = CompositionWorkspace::new(&p.matrix_info);
    let diag = RedoDiagnostics::default();
    let out = redo_one_match(&p, &mut ws, &incoming, &subject, &queries, Some(&diag)).unwrap();

    assert!((0.5..=1.0).contains(&ws.lambda_ratio), "ratio = {}", ws.lambda_ratio);
    assert_eq!(count(&diag.matrices_adjusted), 1);
    assert_eq!(count(&diag.lambda_failures), 0);
    let a = out[0].iter().next().unwrap();
    assert_eq!(a.matrix_adjust_rule, MatrixAdjustRule::ScaleOldMatrix);
    assert!(a.normalized_score(32.0) <= 146);
}

#[test]
fn test_no_adjustment_keeps_scaled_matrix() {
    let fixture = RedoFixture::new();
    let queries = fixture.queries(1e6);
    let subject = fixture.matching();
    let incoming: AlignmentList<EditScript> = fixture.seed();

    let p = params(32.0, CompoAdjustMode::NoAdjustment);
    let mut ws = CompositionWorkspace::new(&p.matrix_info);
    let out = redo_one_match(&p, &mut ws, &incoming, &subject, &queries, None).unwrap();

    assert_eq!(ws.matrix, p.matrix_info.scaled_matrix);
    let a = out[0].iter().next().unwrap();
    assert_eq!(a.matrix_adjust_rule, MatrixAdjustRule::DontAdjust);
    assert_eq!(a.score, 146 * 32);
    assert_eq!(a.normalized_score(32.0), 146);
}

#[test]
fn test_smith_waterman_finds_repeats_best_first() {
    let query = with_sentinel(b"WCHKWMYC");
    let subject_seq = with_sentinel(b"WCHKWMYCGGGGWCHKWMYA");
    let queries = vec![QueryInfo::new(1, SequenceData::borrowed(&query), 1e6)];
    let subject = MatchingSequence::new(0, SequenceData::borrowed(&subject_seq));
    let incoming: AlignmentList<EditScript> =
        vec![Alignment::new(65, MatrixAdjustRule::DontAdjust, 0, 0, 8, 0, 8, 0, None)].into_iter().collect();

    let p = params(1.0, CompoAdjustMode::NoAdjustment);
    let mut ws = CompositionWorkspace::new(&p.matrix_info);
    let mut forbidden = ForbiddenRanges::default();
    let diag = RedoDiagnostics::default();
    let out = redo_one_match_smith_waterman::<_, ()>(
        &p,
        &mut ws,
        &mut forbidden,
        &incoming,
        &subject,
        &queries,
        None,
        Some(&diag),
    )
    .unwrap();

    // Newest first
    let found: Vec<(i32, usize, usize)> = out[0].iter().map(|a| (a.score, a.match_start, a.match_end)).collect();
    assert_eq!(found, vec![(56, 12, 19), (65, 0, 8)]);
    assert_eq!(count(&diag.sw_alignments), 2);
}

#[test]
fn test_smith_waterman_stops_when_heap_is_full() {
    let fixture = RedoFixture::new();
    let queries = fixture.queries(1e6);
    let subject = fixture.matching();
    let incoming: AlignmentList<EditScript> = fixture.seed();

    let mut heap = CompoHeap::new(1, 10.0);
    heap.insert(HeapEntry {
        evalue: 1e-100,
        score: 10_000,
        subject_index: 5,
        payload: (),
    });

    let p = params(1.0, CompoAdjustMode::NoAdjustment);
    let mut ws = CompositionWorkspace::new(&p.matrix_info);
    let mut forbidden = ForbiddenRanges::default();
    let diag = RedoDiagnostics::default();
    let out = redo_one_match_smith_waterman(
        &p,
        &mut ws,
        &mut forbidden,
        &incoming,
        &subject,
        &queries,
        Some(std::slice::from_ref(&heap)),
        Some(&diag),
    )
    .unwrap();

    assert!(out[0].is_empty());
    assert_eq!(count(&diag.early_terminations), 1);
}
