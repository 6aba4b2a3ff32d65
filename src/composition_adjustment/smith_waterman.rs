//! Score-only Smith-Waterman with forbidden ranges
//!
//! Reference: ncbi-blast/c++/src/algo/blast/composition_adjustment/smith_waterman.c
//!   Blast_SmithWatermanScoreOnly / Blast_SmithWatermanFindStart
//!   Blast_ForbiddenRanges*
//!
//! Rows are query positions, columns are subject positions. A gap of length
//! L costs `gap_open + L * gap_extend`. Once an alignment is reported, its
//! envelope is pushed into [`ForbiddenRanges`] so the next pass cannot align
//! the same pairs again.

use crate::utils::matrix::ScoreMatrix;

const NEG_INF: i32 = i32::MIN / 4;

/// Subject ranges that may not be aligned, per query position
#[derive(Debug, Clone, Default)]
pub struct ForbiddenRanges {
    /// Half-open [start, end) subject ranges for each query position
    ranges: Vec<Vec<(usize, usize)>>,
    is_empty: bool,
}

impl ForbiddenRanges {
    pub fn new(query_len: usize) -> Self {
        Self {
            ranges: vec![Vec::new(); query_len],
            is_empty: true,
        }
    }

    /// Forget all ranges, resizing for a query of `query_len`
    pub fn clear(&mut self, query_len: usize) {
        self.ranges.resize_with(query_len, Vec::new);
        for r in self.ranges.iter_mut() {
            r.clear();
        }
        self.is_empty = true;
    }

    /// Forbid subject [`s_start`, `s_end`) at every query position in
    /// [`q_start`, `q_end`)
    pub fn push(&mut self, q_start: usize, q_end: usize, s_start: usize, s_end: usize) {
        let q_end = q_end.min(self.ranges.len());
        for q in q_start..q_end {
            self.ranges[q].push((s_start, s_end));
        }
        if q_start < q_end && s_start < s_end {
            self.is_empty = false;
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    #[inline]
    pub fn is_forbidden(&self, q: usize, s: usize) -> bool {
        !self.is_empty
            && self
                .ranges
                .get(q)
                .map(|r| r.iter().any(|&(start, end)| start <= s && s < end))
                .unwrap_or(false)
    }
}

/// Best local alignment end found by the score-only pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmithWatermanEnd {
    pub score: i32,
    /// Exclusive query end
    pub query_end: usize,
    /// Exclusive subject end
    pub match_end: usize,
}

/// Best local alignment score and where it ends. Cells inside a forbidden
/// range cannot be reached by a diagonal step. Ties keep the first cell in
/// row-major order.
///
/// Reference: smith_waterman.c BLspecialSmithWatermanScoreOnly
pub fn smith_waterman_score_only(
    matrix: &ScoreMatrix,
    query: &[u8],
    subject: &[u8],
    gap_open: i32,
    gap_extend: i32,
    forbidden: &ForbiddenRanges,
) -> SmithWatermanEnd {
    let n = subject.len();
    let open_extend = gap_open + gap_extend;

    // Previous row's H and F per subject column
    let mut h_row = vec![0i32; n + 1];
    let mut f_row = vec![NEG_INF; n + 1];

    let mut best = SmithWatermanEnd {
        score: 0,
        query_end: 0,
        match_end: 0,
    };

    for (i, &q) in query.iter().enumerate() {
        let mut diag = 0; // H[i-1][j-1]
        let mut h_left = 0; // H[i][j-1]
        let mut e = NEG_INF;
        for j in 1..=n {
            e = (e - gap_extend).max(h_left - open_extend);
            let f = (f_row[j] - gap_extend).max(h_row[j] - open_extend);
            f_row[j] = f;

            let mut h = e.max(f).max(0);
            if !forbidden.is_forbidden(i, j - 1) {
                h = h.max(diag + matrix.score(q, subject[j - 1]));
            }

            diag = h_row[j];
            h_row[j] = h;
            h_left = h;

            if h > best.score {
                best = SmithWatermanEnd {
                    score: h,
                    query_end: i + 1,
                    match_end: j,
                };
            }
        }
    }
    best
}

/// Walk backwards from the end pair (`query_end - 1`, `match_end - 1`) and
/// return the (query, subject) start of an alignment reaching `score`.
///
/// Reference: smith_waterman.c BLSpecialSmithWatermanFindStart
pub fn smith_waterman_find_start(
    matrix: &ScoreMatrix,
    query: &[u8],
    subject: &[u8],
    gap_open: i32,
    gap_extend: i32,
    end: &SmithWatermanEnd,
    forbidden: &ForbiddenRanges,
) -> Option<(usize, usize)> {
    let m = end.query_end;
    let n = end.match_end;
    if m == 0 || n == 0 || end.score <= 0 {
        return None;
    }
    let open_extend = gap_open + gap_extend;

    // Row 0 is the virtual origin just past the end pair; only (0, 0) is live
    let mut h_row = vec![NEG_INF; n + 1];
    h_row[0] = 0;
    let mut f_row = vec![NEG_INF; n + 1];

    for i in 1..=m {
        let q_pos = m - i;
        let qr = query[q_pos];
        let mut diag = h_row[0];
        h_row[0] = NEG_INF;
        let mut h_left = NEG_INF;
        let mut e = NEG_INF;
        for j in 1..=n {
            let s_pos = n - j;
            e = (e - gap_extend).max(h_left - open_extend);
            let f = (f_row[j] - gap_extend).max(h_row[j] - open_extend);
            f_row[j] = f;

            let mut h = e.max(f);
            if !forbidden.is_forbidden(q_pos, s_pos) && diag > NEG_INF {
                let d = diag + matrix.score(qr, subject[s_pos]);
                if d == end.score {
                    return Some((q_pos, s_pos));
                }
                h = h.max(d);
            }

            diag = h_row[j];
            h_row[j] = h.max(NEG_INF);
            h_left = h_row[j];
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::matrix::encode_protein;

    fn self_score(matrix: &ScoreMatrix, seq: &[u8]) -> i32 {
        seq.iter().map(|&r| matrix.score(r, r)).sum()
    }

    #[test]
    fn test_finds_embedded_match() {
        let matrix = ScoreMatrix::blosum62();
        let core = encode_protein(b"WCHKWMYC");
        let q = encode_protein(b"GGGWCHKWMYCGGG");
        let s = encode_protein(b"PPPPPWCHKWMYCPP");
        let forbidden = ForbiddenRanges::new(q.len());

        let end = smith_waterman_score_only(&matrix, &q, &s, 11, 1, &forbidden);
        assert_eq!(end.score, self_score(&matrix, &core));
        assert_eq!(end.query_end, 11);
        assert_eq!(end.match_end, 13);

        let start = smith_waterman_find_start(&matrix, &q, &s, 11, 1, &end, &forbidden);
        assert_eq!(start, Some((3, 5)));
    }

    #[test]
    fn test_forbidden_range_excludes_found_alignment() {
        let matrix = ScoreMatrix::blosum62();
        // Two copies of the core in the subject, the first scoring higher
        let q = encode_protein(b"WCHKWMYC");
        let s = encode_protein(b"WCHKWMYCGGGGWCHKWMYA");
        let mut forbidden = ForbiddenRanges::new(q.len());

        let first = smith_waterman_score_only(&matrix, &q, &s, 11, 1, &forbidden);
        assert_eq!(first.match_end, 8);
        let (qs, ss) = smith_waterman_find_start(&matrix, &q, &s, 11, 1, &first, &forbidden).unwrap();
        assert_eq!((qs, ss), (0, 0));

        forbidden.push(qs, first.query_end, ss, first.match_end);
        assert!(!forbidden.is_empty());
        assert!(forbidden.is_forbidden(3, 3));
        assert!(!forbidden.is_forbidden(3, 15));

        let second = smith_waterman_score_only(&matrix, &q, &s, 11, 1, &forbidden);
        assert!(second.score < first.score);
        assert!(second.match_end > 12);
        let (_, ss2) = smith_waterman_find_start(&matrix, &q, &s, 11, 1, &second, &forbidden).unwrap();
        assert!(ss2 >= 8);
    }

    #[test]
    fn test_gapped_local_alignment() {
        let matrix = ScoreMatrix::blosum62();
        let q = encode_protein(b"MKTAYIAKQRQISFVKSHFSRQ");
        let s = encode_protein(b"MKTAYIAKQRGGQISFVKSHFSRQ");
        let forbidden = ForbiddenRanges::new(q.len());
        let end = smith_waterman_score_only(&matrix, &q, &s, 11, 1, &forbidden);
        let full = self_score(&matrix, &q);
        // Either the gapped path or the longer ungapped half wins, never the full self score
        assert!(end.score < full);
        assert!(end.score >= self_score(&matrix, &q[10..]));
        let start = smith_waterman_find_start(&matrix, &q, &s, 11, 1, &end, &forbidden);
        assert!(start.is_some());
    }

    #[test]
    fn test_clear_resets() {
        let mut forbidden = ForbiddenRanges::new(4);
        forbidden.push(0, 4, 0, 10);
        forbidden.clear(6);
        assert!(forbidden.is_empty());
        assert!(!forbidden.is_forbidden(2, 5));
    }
}
