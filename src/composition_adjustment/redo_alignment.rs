//! Recompute a subject's preliminary alignments under composition-adjusted
//! scoring, optionally from an exhaustive Smith-Waterman pass.
//!
//! Reference: ncbi-blast/c++/src/algo/blast/composition_adjustment/redo_alignment.c
//!   Blast_RedoOneMatch / Blast_RedoOneMatchSmithWaterman
//!
//! Incoming alignments are grouped into windows: each alignment's subject
//! range padded by [`KAPPA_WINDOW_BORDER`] on both sides, merged with
//! overlapping windows of the same (query, frame). The matrix is adjusted
//! once per window from the window's composition, then every alignment in
//! it is recomputed. Output lists are newest first, one per query, and
//! scores stay in scaled matrix units.

use anyhow::Result;

use super::alignment::{Alignment, AlignmentList, GappingParams, MatrixAdjustRule};
use super::compo_heap::{early_termination, CompoHeap};
use super::composition::{composition_based_stats, AminoAcidComposition, CompoAdjustMode, CompositionWorkspace, MatrixInfo};
use super::sequence::{MatchingSequence, QueryInfo, SequenceData, SequenceRange};
use super::smith_waterman::{smith_waterman_find_start, smith_waterman_score_only, ForbiddenRanges};
use crate::algorithm::common::diagnostics::RedoDiagnostics;
use crate::stats::karlin::evalue_from_raw;
use crate::utils::matrix::ScoreMatrix;

/// Residues added on each side of an alignment's subject range
// [C] redo_alignment.c #define KAPPA_WINDOW_BORDER 200
pub const KAPPA_WINDOW_BORDER: usize = 200;

/// Data access and alignment routines for one kind of subject.
///
/// `Ok(None)` from an alignment routine means the candidate could not be
/// aligned and is skipped; `Err` aborts the whole subject.
///
/// Reference: redo_alignment.h Blast_RedoAlignCallbacks
pub trait RedoAlignCallbacks {
    /// Traceback attached to each produced alignment
    type Traceback;
    /// Algorithm-specific gapping extras
    type GapContext;

    /// Ungapped lambda of a score distribution, `None` if none exists
    fn calc_lambda(&self, probs: &[f64], min_score: i32, max_score: i32, lambda0: f64) -> Option<f64>;

    /// Residues of `range` within `subject`
    fn get_range<'s>(&self, subject: &'s MatchingSequence<'_>, range: &SequenceRange) -> Result<SequenceData<'s>>;

    /// Recompute `incoming` with `matrix` inside the subject window. The
    /// returned alignment uses full query and subject coordinates.
    #[allow(clippy::too_many_arguments)]
    fn redo_one_alignment(
        &self,
        incoming: &Alignment<Self::Traceback>,
        matrix_adjust_rule: MatrixAdjustRule,
        query: &SequenceData<'_>,
        subject: &SequenceData<'_>,
        subject_range: &SequenceRange,
        matrix: &ScoreMatrix,
        gapping: &GappingParams<Self::GapContext>,
    ) -> Result<Option<Alignment<Self::Traceback>>>;

    /// X-drop alignment constrained to the box [`query_start`, `query_end`) x
    /// [`match_start`, `match_end`) of the window, expected to reach `score`.
    /// Box coordinates are window-relative; the result uses full coordinates.
    #[allow(clippy::too_many_arguments)]
    fn new_xdrop_align(
        &self,
        query_index: usize,
        query: &SequenceData<'_>,
        subject: &SequenceData<'_>,
        subject_range: &SequenceRange,
        query_start: usize,
        query_end: usize,
        match_start: usize,
        match_end: usize,
        score: i32,
        matrix_adjust_rule: MatrixAdjustRule,
        matrix: &ScoreMatrix,
        gapping: &GappingParams<Self::GapContext>,
    ) -> Result<Option<Alignment<Self::Traceback>>>;
}

/// Everything the redo pass needs besides per-thread scratch space
///
/// Reference: redo_alignment.h Blast_RedoAlignParams
pub struct RedoAlignParams<C: RedoAlignCallbacks> {
    pub matrix_info: MatrixInfo,
    pub gapping_params: GappingParams<C::GapContext>,
    pub compo_adjust_mode: CompoAdjustMode,
    /// Score cutoff in scaled units
    pub cutoff_s: i32,
    pub cutoff_e: f64,
    /// Gapped lambda divided by the scaling factor
    pub lambda: f64,
    pub log_k: f64,
    pub window_border: usize,
    pub callbacks: C,
}

impl<C: RedoAlignCallbacks> RedoAlignParams<C> {
    /// E-value of a scaled score against query `query`
    pub fn evalue(&self, score: i32, query: &QueryInfo<'_>) -> f64 {
        evalue_from_raw(score as f64, self.lambda, self.log_k, query.eff_search_space)
    }
}

/// Subject window shared by alignments of one (query, frame)
#[derive(Debug, Clone)]
struct Window {
    query_index: usize,
    range: SequenceRange,
    /// Indices into the incoming alignments, in input order
    members: Vec<usize>,
}

// [C] s_WindowsFromTranslatedAligns: pad by the border, sort by
// (context, begin), then merge while windows overlap
fn windows_from_aligns<T>(aligns: &[&Alignment<T>], subject_len: usize, border: usize) -> Result<Vec<Window>> {
    let to_coord = |pos: usize| {
        i32::try_from(pos).map_err(|_| anyhow::anyhow!("subject position {} does not fit a sequence range", pos))
    };
    let mut windows: Vec<Window> = aligns
        .iter()
        .enumerate()
        .map(|(i, a)| {
            Ok(Window {
                query_index: a.query_index,
                range: SequenceRange::new(
                    to_coord(a.match_start.saturating_sub(border))?,
                    to_coord((a.match_end + border).min(subject_len))?,
                    a.frame,
                ),
                members: vec![i],
            })
        })
        .collect::<Result<_>>()?;
    windows.sort_by_key(|w| (w.query_index, w.range.context, w.range.begin, w.members[0]));

    let mut merged: Vec<Window> = Vec::with_capacity(windows.len());
    for w in windows {
        match merged.last_mut() {
            Some(last)
                if last.query_index == w.query_index
                    && last.range.context == w.range.context
                    && w.range.begin <= last.range.end =>
            {
                last.range.end = last.range.end.max(w.range.end);
                last.members.extend(w.members);
            }
            _ => merged.push(w),
        }
    }
    for w in merged.iter_mut() {
        w.members.sort_unstable();
    }
    merged.sort_by_key(|w| w.members[0]);
    Ok(merged)
}

/// Put the matrix for `window_data` in effect and return how it was made
fn adjust_matrix<C: RedoAlignCallbacks>(
    params: &RedoAlignParams<C>,
    workspace: &mut CompositionWorkspace,
    query_comp: &AminoAcidComposition,
    window_data: &SequenceData<'_>,
    diag: Option<&RedoDiagnostics>,
) -> MatrixAdjustRule {
    match params.compo_adjust_mode {
        CompoAdjustMode::NoAdjustment => {
            workspace.reset(&params.matrix_info);
            MatrixAdjustRule::DontAdjust
        }
        CompoAdjustMode::CompositionBasedStats => {
            workspace.subject_composition = AminoAcidComposition::from_residues(window_data.residues());
            let subject_comp = workspace.subject_composition.clone();
            let ratio = composition_based_stats(workspace, &params.matrix_info, query_comp, &subject_comp, |p, lo, hi, l0| {
                params.callbacks.calc_lambda(p, lo, hi, l0)
            });
            if let Some(d) = diag {
                d.record_adjustment(ratio.is_some());
            }
            if ratio.is_some() {
                MatrixAdjustRule::ScaleOldMatrix
            } else {
                MatrixAdjustRule::DontAdjust
            }
        }
    }
}

/// Box of a redone alignment that no longer matches the box it was redone from
#[derive(Debug, Clone, Copy)]
struct MovedEnvelope {
    frame: i32,
    query: (usize, usize),
    matched: (usize, usize),
}

impl MovedEnvelope {
    /// `None` when the redo left the envelope where it was
    fn between<T>(before: &Alignment<T>, after: &Alignment<T>) -> Option<Self> {
        let unchanged = before.query_start == after.query_start
            && before.query_end == after.query_end
            && before.match_start == after.match_start
            && before.match_end == after.match_end;
        (!unchanged).then_some(Self {
            frame: after.frame,
            query: (after.query_start, after.query_end),
            matched: (after.match_start, after.match_end),
        })
    }

    fn contains_start<T>(&self, candidate: &Alignment<T>) -> bool {
        self.frame == candidate.frame
            && (self.query.0..self.query.1).contains(&candidate.query_start)
            && (self.matched.0..self.matched.1).contains(&candidate.match_start)
    }
}

fn check_query_index(query_index: usize, num_queries: usize) -> Result<()> {
    anyhow::ensure!(
        query_index < num_queries,
        "alignment refers to query {} but only {} queries were given",
        query_index,
        num_queries
    );
    Ok(())
}

/// Recompute every incoming alignment of `subject` with the window's
/// adjusted matrix. `incoming` is newest first; it is processed oldest first.
/// A candidate is skipped when its start falls inside an earlier alignment
/// of the same query that moved during its redo.
///
/// Reference: redo_alignment.c Blast_RedoOneMatch
pub fn redo_one_match<C: RedoAlignCallbacks>(
    params: &RedoAlignParams<C>,
    workspace: &mut CompositionWorkspace,
    incoming: &AlignmentList<C::Traceback>,
    subject: &MatchingSequence<'_>,
    queries: &[QueryInfo<'_>],
    diag: Option<&RedoDiagnostics>,
) -> Result<Vec<AlignmentList<C::Traceback>>> {
    let mut results: Vec<AlignmentList<C::Traceback>> = (0..queries.len()).map(|_| AlignmentList::new()).collect();
    let aligns: Vec<&Alignment<C::Traceback>> = incoming.iter().rev().collect();
    for a in &aligns {
        check_query_index(a.query_index, queries.len())?;
    }

    let mut moved: Vec<Vec<MovedEnvelope>> = vec![Vec::new(); queries.len()];

    for window in windows_from_aligns(&aligns, subject.length, params.window_border)? {
        if let Some(d) = diag {
            d.record_window();
        }
        let query = &queries[window.query_index];
        let window_data = params.callbacks.get_range(subject, &window.range)?;
        let rule = adjust_matrix(params, workspace, &query.composition, &window_data, diag);

        for &member in &window.members {
            let candidate = aligns[member];
            let list = &mut results[window.query_index];
            // Only an alignment that grew or shifted during the redo can swallow a later candidate
            if moved[window.query_index].iter().any(|m| m.contains_start(candidate)) {
                if let Some(d) = diag {
                    d.record_contained();
                }
                continue;
            }
            let redone = params.callbacks.redo_one_alignment(
                candidate,
                rule,
                &query.seq,
                &window_data,
                &window.range,
                &workspace.matrix,
                &params.gapping_params,
            )?;
            match redone {
                Some(new_align) if new_align.score >= params.cutoff_s => {
                    if let Some(d) = diag {
                        d.record_redone();
                    }
                    moved[window.query_index].extend(MovedEnvelope::between(candidate, &new_align));
                    list.push_front(new_align);
                }
                Some(_) => {
                    if let Some(d) = diag {
                        d.record_below_cutoff();
                    }
                }
                None => {
                    if let Some(d) = diag {
                        d.record_failed();
                    }
                }
            }
        }
    }
    Ok(results)
}

/// Find alignments in each window by repeated Smith-Waterman passes, each
/// refined by x-drop alignment inside the Smith-Waterman envelope. Stops a
/// window once the best remaining score misses the cutoffs or the query's
/// heap in `significant_matches` could no longer take it.
///
/// Reference: redo_alignment.c Blast_RedoOneMatchSmithWaterman
#[allow(clippy::too_many_arguments)]
pub fn redo_one_match_smith_waterman<C: RedoAlignCallbacks, P>(
    params: &RedoAlignParams<C>,
    workspace: &mut CompositionWorkspace,
    forbidden: &mut ForbiddenRanges,
    incoming: &AlignmentList<C::Traceback>,
    subject: &MatchingSequence<'_>,
    queries: &[QueryInfo<'_>],
    significant_matches: Option<&[CompoHeap<P>]>,
    diag: Option<&RedoDiagnostics>,
) -> Result<Vec<AlignmentList<C::Traceback>>> {
    let mut results: Vec<AlignmentList<C::Traceback>> = (0..queries.len()).map(|_| AlignmentList::new()).collect();
    let aligns: Vec<&Alignment<C::Traceback>> = incoming.iter().rev().collect();
    for a in &aligns {
        check_query_index(a.query_index, queries.len())?;
    }
    let gap_open = params.gapping_params.gap_open;
    let gap_extend = params.gapping_params.gap_extend;

    for window in windows_from_aligns(&aligns, subject.length, params.window_border)? {
        if let Some(d) = diag {
            d.record_window();
        }
        let query = &queries[window.query_index];
        let query_res = query.seq.residues();
        let window_data = params.callbacks.get_range(subject, &window.range)?;
        let rule = adjust_matrix(params, workspace, &query.composition, &window_data, diag);
        forbidden.clear(query_res.len());

        loop {
            let end = smith_waterman_score_only(&workspace.matrix, query_res, window_data.residues(), gap_open, gap_extend, forbidden);
            if end.score <= 0 || end.score < params.cutoff_s {
                break;
            }
            let evalue = params.evalue(end.score, query);
            if evalue > params.cutoff_e {
                break;
            }
            if let Some(heaps) = significant_matches {
                if early_termination(evalue, heaps, window.query_index) {
                    if let Some(d) = diag {
                        d.record_early_termination();
                    }
                    break;
                }
            }
            let Some((query_start, match_start)) = smith_waterman_find_start(
                &workspace.matrix,
                query_res,
                window_data.residues(),
                gap_open,
                gap_extend,
                &end,
                forbidden,
            ) else {
                break;
            };

            let new_align = params.callbacks.new_xdrop_align(
                window.query_index,
                &query.seq,
                &window_data,
                &window.range,
                query_start,
                end.query_end,
                match_start,
                end.match_end,
                end.score,
                rule,
                &workspace.matrix,
                &params.gapping_params,
            )?;
            forbidden.push(query_start, end.query_end, match_start, end.match_end);

            match new_align {
                Some(a) if a.score >= params.cutoff_s => {
                    if let Some(d) = diag {
                        d.record_sw_alignment();
                    }
                    results[window.query_index].push_front(a);
                }
                Some(_) => {
                    if let Some(d) = diag {
                        d.record_below_cutoff();
                    }
                }
                None => {
                    if let Some(d) = diag {
                        d.record_failed();
                    }
                }
            }
        }
    }
    Ok(results)
}
