//! Seeding for the realigning search: two-hit ungapped extension of word
//! hits, then preliminary gapped alignment of the surviving HSPs.
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/aa_ungapped.c
//!   s_BlastAaWordFinder_TwoHit / s_BlastAaWordFinder_OneHit
//! Reference: ncbi-blast/c++/src/algo/blast/core/blast_gapalign.c
//!   BLAST_GetGappedScore

use rustc_hash::FxHashMap;

use super::constants::{GAPPED_START_WINDOW, GAP_TRIGGER_BITS, X_DROP_GAPPED_PRELIM_BITS, X_DROP_UNGAPPED_BITS};
use crate::algorithm::common::diagnostics::ScanDiagnostics;
use crate::algorithm::common::queries::QuerySet;
use crate::align::{best_start_for_gapped_alignment, extend_one_hit, gapped_align_with_traceback, EditScript, GapScoring, UngappedHsp};
use crate::composition_adjustment::{Alignment, MatrixAdjustRule};
use crate::core::aa_lookup::LookupTable;
use crate::core::aa_scan::{scan_finished, scan_subject, OffsetPair};
use crate::stats::tables::KarlinParams;
use crate::utils::matrix::ScoreMatrix;

/// Raw score equivalent of `bits`
// [C] blast_parameters.c: (Int4)(bits * NCBIMATH_LN2 / kbp->Lambda)
fn bits_to_raw(bits: f64, params: &KarlinParams) -> i32 {
    (bits * std::f64::consts::LN_2 / params.lambda) as i32
}

/// Seeding thresholds in raw (unscaled) score units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedParams {
    pub word_size: usize,
    /// 0 selects one-hit mode
    pub two_hit_window: usize,
    pub x_drop_ungapped: i32,
    /// Ungapped score needed before a gapped extension is tried
    pub gap_trigger: i32,
    pub x_drop_gapped: i32,
    pub start_window: usize,
}

impl SeedParams {
    /// Reference: blast_parameters.c BlastInitialWordParametersNew / BlastExtensionParametersNew
    pub fn new(word_size: usize, two_hit_window: usize, ungapped: &KarlinParams, gapped: &KarlinParams) -> Self {
        // [C] gap_trigger = (Int4)((gap_trigger * NCBIMATH_LN2 + kbp->logK) / kbp->Lambda)
        let gap_trigger = ((GAP_TRIGGER_BITS * std::f64::consts::LN_2 + ungapped.log_k()) / ungapped.lambda) as i32;
        Self {
            word_size,
            two_hit_window,
            x_drop_ungapped: bits_to_raw(X_DROP_UNGAPPED_BITS, ungapped),
            gap_trigger,
            x_drop_gapped: bits_to_raw(X_DROP_GAPPED_PRELIM_BITS, gapped),
            start_window: GAPPED_START_WINDOW,
        }
    }
}

/// Per-diagonal two-hit state
#[derive(Debug, Clone, Copy, Default)]
struct DiagState {
    /// Subject offset of the last word hit, or the end of the last extension
    /// while `extended` is set
    last_hit: usize,
    extended: bool,
    seen: bool,
}

/// Diagonal table for one subject; reused across subjects by `clear`
#[derive(Debug, Default)]
pub struct DiagonalTracker {
    diags: FxHashMap<(usize, isize), DiagState>,
}

impl DiagonalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.diags.clear();
    }
}

/// Ungapped HSP of query `query_index`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedHsp {
    pub query_index: usize,
    pub hsp: UngappedHsp,
}

/// Scan `subject` and extend word hits that pass the two-hit test. Returns
/// the HSPs whose score reaches the gap trigger.
#[allow(clippy::too_many_arguments)]
pub fn find_ungapped_hsps(
    table: &LookupTable,
    queries: &QuerySet,
    subject: &[u8],
    matrix: &ScoreMatrix,
    params: &SeedParams,
    pairs: &mut [OffsetPair],
    tracker: &mut DiagonalTracker,
    diag: Option<&ScanDiagnostics>,
) -> Vec<SeedHsp> {
    tracker.clear();
    let mut seeds = Vec::new();
    let mut start = 0usize;
    while !scan_finished(table, subject, start) {
        let n = scan_subject(table, subject, &mut start, pairs);
        if let Some(d) = diag {
            d.add_word_hits(n);
            if !scan_finished(table, subject, start) {
                d.record_restart();
            }
        }
        for pair in &pairs[..n] {
            let Some((query_index, q_off)) = queries.locate(pair.q_off as usize) else {
                continue;
            };
            let s_off = pair.s_off as usize;
            if let Some(seed) = process_word_hit(queries, subject, matrix, params, tracker, query_index, q_off, s_off, diag) {
                seeds.push(seed);
            }
        }
    }
    seeds
}

#[allow(clippy::too_many_arguments)]
fn process_word_hit(
    queries: &QuerySet,
    subject: &[u8],
    matrix: &ScoreMatrix,
    params: &SeedParams,
    tracker: &mut DiagonalTracker,
    query_index: usize,
    q_off: usize,
    s_off: usize,
    diag: Option<&ScanDiagnostics>,
) -> Option<SeedHsp> {
    let key = (query_index, s_off as isize - q_off as isize);
    let state = tracker.diags.entry(key).or_default();

    // [C] if (flag) { if (subject_offset + diag_offset < last_hit) continue; ... }
    if state.extended {
        if s_off < state.last_hit {
            if let Some(d) = diag {
                d.record_covered_hit();
            }
            return None;
        }
        state.extended = false;
        if params.two_hit_window > 0 {
            state.last_hit = s_off;
            return None;
        }
    }

    if params.two_hit_window > 0 {
        if !state.seen {
            state.seen = true;
            state.last_hit = s_off;
            return None;
        }
        let diff = s_off - state.last_hit;
        if diff >= params.two_hit_window {
            state.last_hit = s_off;
            return None;
        }
        // Overlapping words count as one hit
        if diff < params.word_size {
            return None;
        }
    }

    let query = queries.residues(query_index);
    let hsp = extend_one_hit(matrix, query, subject, q_off, s_off, params.word_size, params.x_drop_ungapped);
    state.seen = true;
    state.extended = true;
    state.last_hit = hsp.s_end();

    let passed = hsp.score >= params.gap_trigger;
    if let Some(d) = diag {
        d.record_ungapped(passed);
    }
    passed.then_some(SeedHsp { query_index, hsp })
}

/// Gapped alignment of each seed, best ungapped score first. Seeds whose
/// anchor falls inside an alignment already found for the same query are
/// dropped. Output keeps the order the alignments were produced in.
pub fn preliminary_gapped_alignments(
    queries: &QuerySet,
    subject: &[u8],
    scoring: &GapScoring,
    params: &SeedParams,
    mut seeds: Vec<SeedHsp>,
    diag: Option<&ScanDiagnostics>,
) -> Vec<Alignment<EditScript>> {
    seeds.sort_by(|a, b| {
        b.hsp
            .score
            .cmp(&a.hsp.score)
            .then_with(|| a.query_index.cmp(&b.query_index))
            .then_with(|| a.hsp.s_start.cmp(&b.hsp.s_start))
    });

    let mut found: Vec<Alignment<EditScript>> = Vec::new();
    for seed in seeds {
        let query = queries.residues(seed.query_index);
        let k = best_start_for_gapped_alignment(scoring.matrix, query, subject, &seed.hsp, params.start_window);
        let q_anchor = seed.hsp.q_start + k;
        let s_anchor = seed.hsp.s_start + k;
        if found
            .iter()
            .any(|a| a.query_index == seed.query_index && a.contains_start(q_anchor, s_anchor))
        {
            continue;
        }
        if let Some(d) = diag {
            d.record_gapped_candidate();
        }
        let gapped = gapped_align_with_traceback(query, subject, q_anchor, s_anchor, scoring, params.x_drop_gapped);
        if gapped.score <= 0 {
            continue;
        }
        found.push(Alignment::new(
            gapped.score,
            MatrixAdjustRule::DontAdjust,
            seed.query_index,
            gapped.q_start,
            gapped.q_end,
            gapped.s_start,
            gapped.s_end,
            0,
            Some(gapped.script),
        ));
    }
    found
}
