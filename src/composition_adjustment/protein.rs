//! Redo callbacks for protein queries against protein subjects
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/blast_kappa.c
//!   s_RedoOneAlignment / s_NewAlignmentUsingXdrop / s_GetRange / s_CalcLambda

use anyhow::{ensure, Result};

use super::alignment::{Alignment, GappingParams, MatrixAdjustRule};
use super::composition::{CompoAdjustMode, MatrixInfo};
use super::redo_alignment::{RedoAlignCallbacks, RedoAlignParams, KAPPA_WINDOW_BORDER};
use super::sequence::{MatchingSequence, SequenceData, SequenceRange};
use crate::align::{best_start_for_gapped_alignment, extend_with_traceback, gapped_align_with_traceback, EditScript, GapScoring, UngappedHsp};
use crate::core::ncbi_math::nint;
use crate::stats::karlin_calc::calc_lambda;
use crate::stats::tables::KarlinParams;
use crate::utils::matrix::ScoreMatrix;

/// Extras the protein callbacks need beyond gap costs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProteinGapContext {
    /// Width of the window used to pick the gapped start on the old diagonal
    pub start_window: usize,
    /// Times x-drop may be doubled when re-aligning a Smith-Waterman envelope
    pub max_xdrop_doublings: usize,
}

impl Default for ProteinGapContext {
    fn default() -> Self {
        // [C] HSP_MAX_WINDOW 11
        Self {
            start_window: 11,
            max_xdrop_doublings: 3,
        }
    }
}

/// Callbacks for in-memory protein subjects; tracebacks are edit scripts
#[derive(Debug, Clone, Copy, Default)]
pub struct ProteinRedo;

fn scoring<'m>(matrix: &'m ScoreMatrix, gapping: &GappingParams<ProteinGapContext>) -> GapScoring<'m> {
    GapScoring {
        matrix,
        gap_open: gapping.gap_open,
        gap_extend: gapping.gap_extend,
        decline_align: gapping.decline_align,
    }
}

impl RedoAlignCallbacks for ProteinRedo {
    type Traceback = EditScript;
    type GapContext = ProteinGapContext;

    fn calc_lambda(&self, probs: &[f64], min_score: i32, max_score: i32, lambda0: f64) -> Option<f64> {
        calc_lambda(probs, min_score, max_score, lambda0)
    }

    fn get_range<'s>(&self, subject: &'s MatchingSequence<'_>, range: &SequenceRange) -> Result<SequenceData<'s>> {
        ensure!(
            range.begin >= 0 && range.begin <= range.end && range.end as usize <= subject.length,
            "range [{}, {}) outside subject {} of length {}",
            range.begin,
            range.end,
            subject.index,
            subject.length
        );
        Ok(subject.data.slice(range.begin as usize, range.end as usize))
    }

    fn redo_one_alignment(
        &self,
        incoming: &Alignment<EditScript>,
        matrix_adjust_rule: MatrixAdjustRule,
        query: &SequenceData<'_>,
        subject: &SequenceData<'_>,
        subject_range: &SequenceRange,
        matrix: &ScoreMatrix,
        gapping: &GappingParams<ProteinGapContext>,
    ) -> Result<Option<Alignment<EditScript>>> {
        let q = query.residues();
        let s = subject.residues();
        let offset = subject_range.begin as usize;
        ensure!(
            incoming.query_end <= q.len() && incoming.match_start >= offset && incoming.match_end <= offset + s.len(),
            "alignment q[{}, {}) s[{}, {}) falls outside its window",
            incoming.query_start,
            incoming.query_end,
            incoming.match_start,
            incoming.match_end
        );

        // Anchor on the old alignment's starting diagonal
        let s_start = incoming.match_start - offset;
        let length = (incoming.query_end - incoming.query_start).min(incoming.match_end - incoming.match_start);
        if length == 0 {
            return Ok(None);
        }
        let hsp = UngappedHsp {
            q_start: incoming.query_start,
            s_start,
            length,
            score: incoming.score,
        };
        let k = best_start_for_gapped_alignment(matrix, q, s, &hsp, gapping.context.start_window);

        let gapped = gapped_align_with_traceback(q, s, hsp.q_start + k, hsp.s_start + k, &scoring(matrix, gapping), gapping.x_dropoff);
        if gapped.score <= 0 {
            return Ok(None);
        }
        Ok(Some(Alignment::new(
            gapped.score,
            matrix_adjust_rule,
            incoming.query_index,
            gapped.q_start,
            gapped.q_end,
            gapped.s_start + offset,
            gapped.s_end + offset,
            incoming.frame,
            Some(gapped.script),
        )))
    }

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
        gapping: &GappingParams<ProteinGapContext>,
    ) -> Result<Option<Alignment<EditScript>>> {
        let q = query.residues();
        let s = subject.residues();
        ensure!(
            query_start <= query_end && query_end <= q.len() && match_start <= match_end && match_end <= s.len(),
            "envelope q[{}, {}) s[{}, {}) outside the sequences",
            query_start,
            query_end,
            match_start,
            match_end
        );
        let scoring = scoring(matrix, gapping);
        let q_box = &q[query_start..query_end];
        let s_box = &s[match_start..match_end];

        // [C] s_NewAlignmentUsingXdrop: retry with a doubled x-drop while the
        // extension falls short of the Smith-Waterman score
        let mut x_drop = gapping.x_dropoff;
        let mut ext = extend_with_traceback(q_box, s_box, &scoring, x_drop, false);
        let mut doublings = 0;
        while ext.score < score && doublings < gapping.context.max_xdrop_doublings {
            x_drop = x_drop.saturating_mul(2);
            ext = extend_with_traceback(q_box, s_box, &scoring, x_drop, false);
            doublings += 1;
        }
        if ext.score <= 0 {
            return Ok(None);
        }

        let offset = subject_range.begin as usize;
        Ok(Some(Alignment::new(
            ext.score,
            matrix_adjust_rule,
            query_index,
            query_start,
            query_start + ext.q_len,
            offset + match_start,
            offset + match_start + ext.s_len,
            subject_range.context,
            Some(ext.script),
        )))
    }
}

/// Redo parameters for a protein search. Gap costs, x-drop and the score
/// cutoff are given in unscaled units and scaled here to match the matrix.
#[allow(clippy::too_many_arguments)]
pub fn protein_redo_params(
    matrix_info: MatrixInfo,
    gap_open: i32,
    gap_extend: i32,
    x_dropoff: i32,
    gapped: &KarlinParams,
    cutoff_s: i32,
    cutoff_e: f64,
    compo_adjust_mode: CompoAdjustMode,
) -> RedoAlignParams<ProteinRedo> {
    let scale = matrix_info.scaling_factor;
    let scaled = |v: i32| nint(v as f64 * scale) as i32;
    RedoAlignParams {
        gapping_params: GappingParams {
            gap_open: scaled(gap_open),
            gap_extend: scaled(gap_extend),
            decline_align: i32::MAX / 4,
            x_dropoff: scaled(x_dropoff),
            context: ProteinGapContext::default(),
        },
        compo_adjust_mode,
        cutoff_s: scaled(cutoff_s),
        cutoff_e,
        lambda: gapped.lambda / scale,
        log_k: gapped.log_k(),
        window_border: KAPPA_WINDOW_BORDER,
        callbacks: ProteinRedo,
        matrix_info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::EditOp;
    use crate::composition_adjustment::{
        redo_one_match, redo_one_match_smith_waterman, AlignmentList, CompositionWorkspace, ForbiddenRanges, QueryInfo,
    };
    use crate::stats::tables::blosum62_gapped;
    use crate::utils::matrix::encode_protein;

    const QUERY: &[u8] = b"MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQ";
    const SUBJECT: &[u8] = b"PPPPMKTAYIAKQRQISFVKSHGGGFSRQLEERLGLIEVQPPPP";

    fn unscaled_params(mode: CompoAdjustMode) -> RedoAlignParams<ProteinRedo> {
        let karlin = blosum62_gapped(11, 1).unwrap();
        protein_redo_params(MatrixInfo::blosum62(1.0), 11, 1, 38, &karlin, 25, 10.0, mode)
    }

    #[test]
    fn test_get_range_checks_bounds() {
        let subject = MatchingSequence::new(0, SequenceData::from_residues(&encode_protein(SUBJECT)));
        assert!(ProteinRedo.get_range(&subject, &SequenceRange::new(4, 20, 0)).is_ok());
        assert!(ProteinRedo.get_range(&subject, &SequenceRange::new(4, 200, 0)).is_err());
    }

    #[test]
    fn test_redo_recovers_gapped_alignment() {
        let q = encode_protein(QUERY);
        let s = encode_protein(SUBJECT);
        let queries = vec![QueryInfo::new(0, SequenceData::from_residues(&q), 1e6)];
        let subject = MatchingSequence::new(0, SequenceData::from_residues(&s));
        // Ungapped seed covering the first half only
        let incoming: AlignmentList<EditScript> =
            vec![Alignment::new(80, MatrixAdjustRule::DontAdjust, 0, 0, 18, 4, 22, 0, None)].into_iter().collect();

        let p = unscaled_params(CompoAdjustMode::NoAdjustment);
        let mut ws = CompositionWorkspace::new(&p.matrix_info);
        let out = redo_one_match(&p, &mut ws, &incoming, &subject, &queries, None).unwrap();

        let a = out[0].iter().next().unwrap();
        assert_eq!(a.score, 146);
        assert_eq!((a.query_start, a.query_end), (0, 33));
        assert_eq!((a.match_start, a.match_end), (4, 40));
        let script = a.context.as_ref().unwrap();
        assert_eq!(script.ops().iter().filter(|&&op| op == EditOp::Del).count(), 3);
        let scoring = scoring(&ws.matrix, &p.gapping_params);
        assert_eq!(scoring.score_script(script, &q, &s, a.query_start, a.match_start), a.score);
    }

    #[test]
    fn test_adjusted_scores_stay_scaled() {
        let q = encode_protein(QUERY);
        let s = encode_protein(SUBJECT);
        let queries = vec![QueryInfo::new(0, SequenceData::from_residues(&q), 1e6)];
        let subject = MatchingSequence::new(0, SequenceData::from_residues(&s));
        let incoming: AlignmentList<EditScript> =
            vec![Alignment::new(80, MatrixAdjustRule::DontAdjust, 0, 0, 18, 4, 22, 0, None)].into_iter().collect();

        let karlin = blosum62_gapped(11, 1).unwrap();
        let p = protein_redo_params(MatrixInfo::blosum62(32.0), 11, 1, 38, &karlin, 25, 10.0, CompoAdjustMode::CompositionBasedStats);
        let mut ws = CompositionWorkspace::new(&p.matrix_info);
        let out = redo_one_match(&p, &mut ws, &incoming, &subject, &queries, None).unwrap();

        let a = out[0].iter().next().unwrap();
        assert_eq!(a.matrix_adjust_rule, MatrixAdjustRule::ScaleOldMatrix);
        // Rescaling by a ratio in [0.5, 1] shrinks the identical-pair columns
        let normalized = a.normalized_score(32.0);
        assert!((60..=146).contains(&normalized), "normalized = {}", normalized);
    }

    #[test]
    fn test_smith_waterman_redo_matches_xdrop() {
        let q = encode_protein(QUERY);
        let s = encode_protein(SUBJECT);
        let queries = vec![QueryInfo::new(0, SequenceData::from_residues(&q), 1e6)];
        let subject = MatchingSequence::new(0, SequenceData::from_residues(&s));
        let incoming: AlignmentList<EditScript> =
            vec![Alignment::new(80, MatrixAdjustRule::DontAdjust, 0, 0, 18, 4, 22, 0, None)].into_iter().collect();

        let p = unscaled_params(CompoAdjustMode::NoAdjustment);
        let mut ws = CompositionWorkspace::new(&p.matrix_info);
        let mut forbidden = ForbiddenRanges::new(q.len());
        let out = redo_one_match_smith_waterman::<_, ()>(&p, &mut ws, &mut forbidden, &incoming, &subject, &queries, None, None)
            .unwrap();

        let best = out[0].iter().last().unwrap();
        assert_eq!(best.score, 146);
        assert_eq!((best.query_start, best.query_end), (0, 33));
        assert_eq!((best.match_start, best.match_end), (4, 40));
    }

    #[test]
    fn test_params_are_scaled() {
        let karlin = blosum62_gapped(11, 1).unwrap();
        let p = protein_redo_params(MatrixInfo::blosum62(32.0), 11, 1, 38, &karlin, 25, 10.0, CompoAdjustMode::CompositionBasedStats);
        assert_eq!(p.gapping_params.gap_open, 352);
        assert_eq!(p.gapping_params.gap_extend, 32);
        assert_eq!(p.cutoff_s, 800);
        assert!((p.lambda * 32.0 - karlin.lambda).abs() < 1e-12);
    }
}
