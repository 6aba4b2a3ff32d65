//! X-drop gapped alignment with full traceback
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/blast_gapalign.c
//!   ALIGN_EX (Blast_SemiGappedAlign with traceback) and
//!   BLAST_GappedAlignmentWithTraceback
//!
//! The DP is anchored at the origin: cell (i, j) holds the best score of an
//! alignment of the first i query residues with the first j subject residues
//! that starts at (0, 0). Cells scoring more than `x_drop` below the best
//! score seen so far are dead, and each row only spans the live columns, so
//! the traceback storage grows with the explored band, not with m * n.

use super::result::{EditOp, EditScript};
use crate::utils::matrix::ScoreMatrix;

const NEG_INF: i32 = i32::MIN / 4;

// Source of H in the low two bits
const FROM_DIAG: u8 = 0;
const FROM_E: u8 = 1;
const FROM_F: u8 = 2;
const ORIGIN: u8 = 3;
const SOURCE_MASK: u8 = 3;
// E (horizontal gap) continued from E at j - 1
const E_EXTEND: u8 = 4;
// F (vertical gap) continued from F at i - 1
const F_EXTEND: u8 = 8;

/// Substitution and affine gap scoring for the DP
#[derive(Debug, Clone, Copy)]
pub struct GapScoring<'a> {
    pub matrix: &'a ScoreMatrix,
    pub gap_open: i32,
    pub gap_extend: i32,
    /// Cost of leaving a pair unaligned; substitutions never score below
    /// `-decline_align`.
    pub decline_align: i32,
}

impl<'a> GapScoring<'a> {
    #[inline(always)]
    pub fn substitution(&self, a: u8, b: u8) -> i32 {
        self.matrix.score(a, b).max(-self.decline_align)
    }

    /// Score an edit script placed at (`q_start`, `s_start`)
    pub fn score_script(&self, script: &EditScript, query: &[u8], subject: &[u8], q_start: usize, s_start: usize) -> i32 {
        script.score(query, subject, q_start, s_start, self.gap_open, self.gap_extend, |a, b| {
            self.substitution(a, b)
        })
    }
}

/// Per-row traceback codes over the explored band
#[derive(Debug, Default)]
pub struct TracebackMatrix {
    codes: Vec<u8>,
    /// (first column, offset into `codes`) per row
    rows: Vec<(usize, usize)>,
}

impl TracebackMatrix {
    fn start_row(&mut self, first_col: usize) {
        self.rows.push((first_col, self.codes.len()));
    }

    #[inline]
    fn push(&mut self, code: u8) {
        self.codes.push(code);
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        let (first, offset) = self.rows[row];
        debug_assert!(col >= first);
        self.codes[offset + col - first]
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// Cells stored so far
    pub fn cells(&self) -> usize {
        self.codes.len()
    }
}

/// One-directional extension from the origin
#[derive(Debug, Clone, Default)]
pub struct Extension {
    pub score: i32,
    /// Query residues consumed
    pub q_len: usize,
    /// Subject residues consumed
    pub s_len: usize,
    /// Columns in forward order when `reverse` was false, outward order otherwise
    pub script: EditScript,
}

#[inline(always)]
fn residue(seq: &[u8], idx: usize, reverse: bool) -> u8 {
    if reverse {
        seq[seq.len() - 1 - idx]
    } else {
        seq[idx]
    }
}

/// X-drop extension of `query` against `subject` from their first residues,
/// or from their last residues walking backwards when `reverse` is set.
///
/// Reference: blast_gapalign.c ALIGN_EX
pub fn extend_with_traceback(query: &[u8], subject: &[u8], scoring: &GapScoring, x_drop: i32, reverse: bool) -> Extension {
    let m = query.len();
    let n = subject.len();
    let open_extend = scoring.gap_open + scoring.gap_extend;
    let extend = scoring.gap_extend;

    let mut trace = TracebackMatrix::default();
    let mut best = 0i32;
    let mut best_i = 0usize;
    let mut best_j = 0usize;

    // Row 0: leading gap in the query
    let mut prev_h: Vec<i32> = Vec::new();
    let mut prev_f: Vec<i32> = Vec::new();
    trace.start_row(0);
    prev_h.push(0);
    prev_f.push(NEG_INF);
    trace.push(ORIGIN);
    let mut e = NEG_INF;
    for j in 1..=n {
        e = if j == 1 { -open_extend } else { e - extend };
        if e < best.saturating_sub(x_drop) {
            break;
        }
        prev_h.push(e);
        prev_f.push(NEG_INF);
        trace.push(FROM_E | if j > 1 { E_EXTEND } else { 0 });
    }
    let mut prev_start = 0usize;

    let mut cur_h: Vec<i32> = Vec::new();
    let mut cur_f: Vec<i32> = Vec::new();

    for i in 1..=m {
        let a = residue(query, i - 1, reverse);
        let prev_end = prev_start + prev_h.len();
        cur_h.clear();
        cur_f.clear();
        trace.start_row(prev_start);

        let mut e = NEG_INF;
        let mut h_left = NEG_INF;
        let mut last_live: Option<usize> = None;
        let mut j = prev_start;
        while j <= n {
            let up = if j < prev_end { j - prev_start } else { usize::MAX };
            let mut code = 0u8;

            // F: vertical move, consumes a query residue
            let f = if up != usize::MAX {
                let open = prev_h[up] - open_extend;
                let ext = prev_f[up] - extend;
                if ext > open {
                    code |= F_EXTEND;
                    ext
                } else {
                    open
                }
            } else {
                NEG_INF
            };

            // E: horizontal move, consumes a subject residue
            if j > prev_start {
                let open = h_left - open_extend;
                let ext = e - extend;
                e = if ext > open {
                    code |= E_EXTEND;
                    ext
                } else {
                    open
                };
            }

            let diag = if j > prev_start && j - 1 < prev_end {
                prev_h[j - 1 - prev_start] + scoring.substitution(a, residue(subject, j - 1, reverse))
            } else {
                NEG_INF
            };

            let mut h = diag;
            if e > h {
                h = e;
                code = (code & !SOURCE_MASK) | FROM_E;
            }
            if f > h {
                h = f;
                code = (code & !SOURCE_MASK) | FROM_F;
            }

            let (h, f_out) = if h < best.saturating_sub(x_drop).max(NEG_INF / 2) {
                e = NEG_INF;
                (NEG_INF, NEG_INF)
            } else {
                last_live = Some(j);
                if h > best {
                    best = h;
                    best_i = i;
                    best_j = j;
                }
                (h, f)
            };

            cur_h.push(h);
            cur_f.push(f_out);
            trace.push(code);
            h_left = h;

            // Past the previous row only a live horizontal gap can continue
            if j >= prev_end && h == NEG_INF {
                break;
            }
            j += 1;
        }

        let Some(last) = last_live else {
            break;
        };

        // Drop dead columns at both ends of the new row
        let first_live = cur_h.iter().position(|&h| h > NEG_INF).unwrap_or(0);
        let keep = last + 1 - prev_start;

        prev_h.clear();
        prev_f.clear();
        prev_h.extend_from_slice(&cur_h[first_live..keep]);
        prev_f.extend_from_slice(&cur_f[first_live..keep]);
        prev_start += first_live;
    }

    let script = trace_back(&trace, best_i, best_j, query, subject, reverse);
    Extension {
        score: best,
        q_len: best_i,
        s_len: best_j,
        script,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    H,
    E,
    F,
}

/// Walk the stored codes from (`i`, `j`) back to the origin.
fn trace_back(trace: &TracebackMatrix, mut i: usize, mut j: usize, query: &[u8], subject: &[u8], reverse: bool) -> EditScript {
    let mut script = EditScript::new();
    let mut state = State::H;
    while i > 0 || j > 0 {
        let code = trace.get(i, j);
        match state {
            State::H => match code & SOURCE_MASK {
                FROM_DIAG => {
                    let a = residue(query, i - 1, reverse);
                    let b = residue(subject, j - 1, reverse);
                    script.push(if a == b { EditOp::Match } else { EditOp::Mismatch });
                    i -= 1;
                    j -= 1;
                }
                FROM_E => state = State::E,
                FROM_F => state = State::F,
                _ => break,
            },
            State::E => {
                script.push(EditOp::Del);
                if code & E_EXTEND == 0 {
                    state = State::H;
                }
                j -= 1;
            }
            State::F => {
                script.push(EditOp::Ins);
                if code & F_EXTEND == 0 {
                    state = State::H;
                }
                i -= 1;
            }
        }
    }
    if !reverse {
        script.reverse();
    }
    script
}

/// Gapped alignment through an anchor pair
#[derive(Debug, Clone)]
pub struct GappedAlignment {
    pub score: i32,
    pub q_start: usize,
    /// Exclusive
    pub q_end: usize,
    pub s_start: usize,
    /// Exclusive
    pub s_end: usize,
    pub script: EditScript,
}

/// Extend left (including the anchor pair) and right from
/// (`q_anchor`, `s_anchor`) and join the two halves.
///
/// Reference: blast_gapalign.c BLAST_GappedAlignmentWithTraceback
pub fn gapped_align_with_traceback(
    query: &[u8],
    subject: &[u8],
    q_anchor: usize,
    s_anchor: usize,
    scoring: &GapScoring,
    x_drop: i32,
) -> GappedAlignment {
    debug_assert!(q_anchor < query.len() && s_anchor < subject.len());

    let left = extend_with_traceback(&query[..=q_anchor], &subject[..=s_anchor], scoring, x_drop, true);
    let right = extend_with_traceback(&query[q_anchor + 1..], &subject[s_anchor + 1..], scoring, x_drop, false);

    // The left half was traced outward from the anchor; that is already
    // forward order once read from its far end.
    let mut script = left.script;
    script.reverse();
    script.append(&right.script);

    GappedAlignment {
        score: left.score + right.score,
        q_start: q_anchor + 1 - left.q_len,
        q_end: q_anchor + 1 + right.q_len,
        s_start: s_anchor + 1 - left.s_len,
        s_end: s_anchor + 1 + right.s_len,
        script,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::matrix::encode_protein;

    fn blosum_scoring(matrix: &ScoreMatrix) -> GapScoring<'_> {
        GapScoring {
            matrix,
            gap_open: 11,
            gap_extend: 1,
            decline_align: i32::MAX / 4,
        }
    }

    #[test]
    fn test_identical_sequences_align_ungapped() {
        let matrix = ScoreMatrix::blosum62();
        let scoring = blosum_scoring(&matrix);
        let q = encode_protein(b"MKTAYIAKQRQISFVKSHFSRQ");
        let ext = extend_with_traceback(&q, &q, &scoring, 40, false);
        let self_score: i32 = q.iter().map(|&r| matrix.score(r, r)).sum();
        assert_eq!(ext.score, self_score);
        assert_eq!(ext.q_len, q.len());
        assert_eq!(ext.s_len, q.len());
        assert!(ext.script.ops().iter().all(|&op| op == EditOp::Match));
    }

    #[test]
    fn test_traceback_score_matches_rescore() {
        let matrix = ScoreMatrix::blosum62();
        let scoring = blosum_scoring(&matrix);
        let q = encode_protein(b"MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQ");
        let s = encode_protein(b"MKTAYIAKQRQISFVKSHGGGFSRQLEERLGLIEVQ");
        let ext = extend_with_traceback(&q, &s, &scoring, 60, false);
        assert_eq!(ext.script.query_len(), ext.q_len);
        assert_eq!(ext.script.subject_len(), ext.s_len);
        assert_eq!(scoring.score_script(&ext.script, &q, &s, 0, 0), ext.score);
        assert_eq!(ext.script.stats().gap_opens, 1);
        assert_eq!(ext.script.stats().gaps, 3);
    }

    #[test]
    fn test_reverse_extension_matches_reversed_input() {
        let matrix = ScoreMatrix::blosum62();
        let scoring = blosum_scoring(&matrix);
        let q = encode_protein(b"WWCHKLMNPQRWY");
        let s = encode_protein(b"WWCHKAMNPQRWY");
        let fwd = extend_with_traceback(&q, &s, &scoring, 30, false);
        let rq: Vec<u8> = q.iter().rev().copied().collect();
        let rs: Vec<u8> = s.iter().rev().copied().collect();
        let rev = extend_with_traceback(&rq, &rs, &scoring, 30, true);
        assert_eq!(fwd.score, rev.score);
        assert_eq!(fwd.q_len, rev.q_len);
    }

    #[test]
    fn test_xdrop_stops_in_unrelated_tail() {
        let matrix = ScoreMatrix::blosum62();
        let scoring = blosum_scoring(&matrix);
        let q = encode_protein(b"WWWWWPPPPPPPPPPPPPPPP");
        let s = encode_protein(b"WWWWWCCCCCCCCCCCCCCCC");
        let ext = extend_with_traceback(&q, &s, &scoring, 10, false);
        assert_eq!(ext.score, 55);
        assert_eq!(ext.q_len, 5);
        assert_eq!(ext.s_len, 5);
        assert!(ext.script.len() == 5);
    }

    #[test]
    fn test_gapped_align_through_anchor() {
        let matrix = ScoreMatrix::blosum62();
        let scoring = blosum_scoring(&matrix);
        let q = encode_protein(b"PPPPMKTAYIAKQRQISFVKSHFSRQPPPP");
        let s = encode_protein(b"GGMKTAYIAKQRQISFVKSHFSRQGG");
        // anchor on the I of "AYIAK": query offset 9, subject offset 7
        let aln = gapped_align_with_traceback(&q, &s, 9, 7, &scoring, 30);
        assert_eq!(aln.q_start, 4);
        assert_eq!(aln.s_start, 2);
        assert_eq!(aln.q_end - aln.q_start, 22);
        assert_eq!(aln.s_end - aln.s_start, 22);
        assert_eq!(scoring.score_script(&aln.script, &q, &s, aln.q_start, aln.s_start), aln.score);
    }
}
