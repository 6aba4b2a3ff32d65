//! Ungapped x-drop extension of a word hit
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/aa_ungapped.c
//!   s_BlastAaExtendLeft / s_BlastAaExtendRight / s_BlastAaExtendOneHit

use crate::utils::matrix::ScoreMatrix;

/// Ungapped segment pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UngappedHsp {
    pub q_start: usize,
    pub s_start: usize,
    pub length: usize,
    pub score: i32,
}

impl UngappedHsp {
    #[inline]
    pub fn q_end(&self) -> usize {
        self.q_start + self.length
    }

    #[inline]
    pub fn s_end(&self) -> usize {
        self.s_start + self.length
    }
}

// NCBI BLAST reference (c++/src/algo/blast/core/aa_ungapped.c:886-921):
//   for (i = n; i >= 0; i--) {
//       score += matrix[q[i]][s[i]];
//       if (score > maxscore) { maxscore = score; best_i = i; }
//       if ((maxscore - score) >= dropoff) break;
//   }
/// Walk left from the pair just before (`q_end`, `s_end`).
/// Returns (best score, residues covered).
fn extend_left(matrix: &ScoreMatrix, query: &[u8], subject: &[u8], q_end: usize, s_end: usize, x_drop: i32) -> (i32, usize) {
    let n = q_end.min(s_end);
    let mut score = 0;
    let mut max_score = 0;
    let mut best_len = 0;
    for i in 1..=n {
        score += matrix.score(query[q_end - i], subject[s_end - i]);
        if score > max_score {
            max_score = score;
            best_len = i;
        }
        if max_score - score >= x_drop {
            break;
        }
    }
    (max_score, best_len)
}

// NCBI BLAST reference (c++/src/algo/blast/core/aa_ungapped.c:846-866):
//   if (score <= 0 || (maxscore - score) >= dropoff) break;
/// Walk right from (`q_off`, `s_off`) carrying `initial` score.
/// Returns (best total score, residues covered).
fn extend_right(matrix: &ScoreMatrix, query: &[u8], subject: &[u8], q_off: usize, s_off: usize, initial: i32, x_drop: i32) -> (i32, usize) {
    let n = (query.len() - q_off).min(subject.len() - s_off);
    let mut score = initial;
    let mut max_score = initial;
    let mut best_len = 0;
    for i in 0..n {
        score += matrix.score(query[q_off + i], subject[s_off + i]);
        if score > max_score {
            max_score = score;
            best_len = i + 1;
        }
        if score <= 0 || max_score - score >= x_drop {
            break;
        }
    }
    (max_score, best_len)
}

/// Extend the word hit at (`q_off`, `s_off`) in both directions.
///
/// The left pass starts at the last word residue, so it covers the word.
pub fn extend_one_hit(
    matrix: &ScoreMatrix,
    query: &[u8],
    subject: &[u8],
    q_off: usize,
    s_off: usize,
    word_size: usize,
    x_drop: i32,
) -> UngappedHsp {
    let q_word_end = (q_off + word_size).min(query.len());
    let s_word_end = (s_off + word_size).min(subject.len());
    let (left_score, left_len) = extend_left(matrix, query, subject, q_word_end, s_word_end, x_drop);
    let (score, right_len) = extend_right(matrix, query, subject, q_word_end, s_word_end, left_score, x_drop);
    UngappedHsp {
        q_start: q_word_end - left_len,
        s_start: s_word_end - left_len,
        length: left_len + right_len,
        score,
    }
}

/// Offset into the HSP of the best `window`-residue stretch, used to anchor
/// gapped extension. Falls back to the middle of short segments.
///
/// Reference: blast_gapalign.c BlastGetStartForGappedAlignment
pub fn best_start_for_gapped_alignment(matrix: &ScoreMatrix, query: &[u8], subject: &[u8], hsp: &UngappedHsp, window: usize) -> usize {
    if hsp.length <= window {
        return hsp.length / 2;
    }
    let pair = |k: usize| matrix.score(query[hsp.q_start + k], subject[hsp.s_start + k]);
    let mut score: i32 = (0..window).map(pair).sum();
    let mut max_score = score;
    let mut max_offset = window - 1;
    for k in window..hsp.length {
        score += pair(k) - pair(k - window);
        if score > max_score {
            max_score = score;
            max_offset = k;
        }
    }
    if max_score > 0 {
        max_offset - window / 2
    } else {
        hsp.length / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::matrix::encode_protein;

    #[test]
    fn test_extend_one_hit_covers_shared_core() {
        let matrix = ScoreMatrix::blosum62();
        let q = encode_protein(b"PPPPPWCHKWMPPPPP");
        let s = encode_protein(b"GGWCHKWMGG");
        // word "HKW" at query 7, subject 4
        let hsp = extend_one_hit(&matrix, &q, &s, 7, 4, 3, 16);
        assert_eq!(hsp.q_start, 5);
        assert_eq!(hsp.s_start, 2);
        assert_eq!(hsp.length, 6);
        let expected: i32 = encode_protein(b"WCHKWM").iter().map(|&r| matrix.score(r, r)).sum();
        assert_eq!(hsp.score, expected);
        assert_eq!(hsp.q_end(), 11);
        assert_eq!(hsp.s_end(), 8);
    }

    #[test]
    fn test_best_start_prefers_high_scoring_window() {
        let matrix = ScoreMatrix::blosum62();
        let q = encode_protein(b"AAAAAAAAAAAAWWWWWWWWWWWAAA");
        let hsp = UngappedHsp {
            q_start: 0,
            s_start: 0,
            length: q.len(),
            score: 0,
        };
        let start = best_start_for_gapped_alignment(&matrix, &q, &q, &hsp, 11);
        assert!((12..23).contains(&start), "start = {}", start);
    }
}
