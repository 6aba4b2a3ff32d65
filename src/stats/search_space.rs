//! Effective search space with NCBI length adjustment
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/blast_stat.c:5041-5126
//!   BLAST_ComputeLengthAdjustment
//!            ncbi-blast/c++/src/algo/blast/core/blast_setup.c BLAST_CalcEffLengths

use super::tables::KarlinParams;

/// Result of the length adjustment fixed-point search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthAdjustment {
    pub length_adjustment: i64,
    pub converged: bool,
}

/// Largest integer `ell` with `ell <= alpha/lambda * (logK + ln((m - ell)(n - N ell))) + beta`.
///
/// `n` is the total database length and `num_seqs` the number of database
/// sequences.
pub fn compute_length_adjustment(
    query_length: i64,
    db_length: i64,
    num_seqs: i64,
    params: &KarlinParams,
) -> LengthAdjustment {
    const MAX_ITERATIONS: i32 = 20;

    let m = query_length as f64;
    let n = db_length as f64;
    let big_n = num_seqs as f64;
    if m <= 0.0 || n <= 0.0 || params.k <= 0.0 || params.lambda <= 0.0 {
        return LengthAdjustment {
            length_adjustment: 0,
            converged: false,
        };
    }

    let log_k = params.k.ln();
    let alpha_d_lambda = params.alpha / params.lambda;
    let beta = params.beta;
    let fixed_point = |ell: f64| alpha_d_lambda * (log_k + ((m - ell) * (n - big_n * ell)).ln()) + beta;

    // Upper bound: largest ell with K (m - ell)(n - N ell) > max(m, n)
    let a = big_n;
    let mb = m * big_n + n;
    let c = n * m - m.max(n) / params.k;
    if c < 0.0 {
        return LengthAdjustment {
            length_adjustment: 0,
            converged: true,
        };
    }
    let disc = mb * mb - 4.0 * a * c;
    if disc < 0.0 {
        return LengthAdjustment {
            length_adjustment: 0,
            converged: false,
        };
    }

    let mut ell_min = 0.0_f64;
    let mut ell_max = 2.0 * c / (mb + disc.sqrt());
    let mut ell_next = 0.0_f64;
    let mut converged = false;

    for i in 1..=MAX_ITERATIONS {
        let ell = ell_next;
        let ell_bar = fixed_point(ell);
        if ell_bar >= ell {
            ell_min = ell;
            if ell_bar - ell_min <= 1.0 {
                converged = true;
                break;
            }
            if ell_min == ell_max {
                break;
            }
        } else {
            ell_max = ell;
        }

        ell_next = if ell_min <= ell_bar && ell_bar <= ell_max {
            ell_bar
        } else if i == 1 {
            ell_max
        } else {
            (ell_min + ell_max) / 2.0
        };
    }

    // [C] *length_adjustment = (Int4) ell_min;
    let mut length_adjustment = ell_min as i64;
    if converged {
        let ell_ceil = ell_min.ceil();
        if ell_ceil <= ell_max && fixed_point(ell_ceil) >= ell_ceil {
            length_adjustment = ell_ceil as i64;
        }
    }

    LengthAdjustment {
        length_adjustment,
        converged,
    }
}

/// Effective lengths and their product
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSpace {
    pub effective_query_len: f64,
    pub effective_db_len: f64,
    pub effective_space: f64,
    pub length_adjustment: i64,
}

impl SearchSpace {
    /// Raw lengths, no adjustment
    pub fn simple(query_len: usize, db_len: usize) -> Self {
        let q = query_len as f64;
        let d = db_len as f64;
        Self {
            effective_query_len: q,
            effective_db_len: d,
            effective_space: q * d,
            length_adjustment: 0,
        }
    }

    /// Search space of one query against a database of `num_seqs` sequences
    /// totalling `db_len` residues.
    ///
    /// Reference: blast_setup.c BLAST_CalcEffLengths
    pub fn for_database_search(query_len: usize, db_len: usize, num_seqs: usize, params: &KarlinParams) -> Self {
        let adj = compute_length_adjustment(query_len as i64, db_len as i64, num_seqs as i64, params);
        let ell = adj.length_adjustment as f64;

        let effective_query_len = (query_len as f64 - ell).max(1.0);
        let effective_db_len = (db_len as f64 - num_seqs as f64 * ell).max(1.0);
        Self {
            effective_query_len,
            effective_db_len,
            effective_space: effective_query_len * effective_db_len,
            length_adjustment: adj.length_adjustment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::tables::blosum62_gapped;

    #[test]
    fn test_simple_search_space() {
        let ss = SearchSpace::simple(100, 1000);
        assert_eq!(ss.effective_space, 100000.0);
        assert_eq!(ss.length_adjustment, 0);
    }

    #[test]
    fn test_length_adjustment_is_fixed_point_floor() {
        let params = blosum62_gapped(11, 1).unwrap();
        for (m, n) in [(100i64, 1000i64), (1000, 10000), (300, 5_000_000)] {
            let adj = compute_length_adjustment(m, n, 1, &params);
            assert!(adj.converged);
            assert!(adj.length_adjustment >= 0 && adj.length_adjustment < m.min(n));

            let ell = adj.length_adjustment as f64;
            let rhs = params.alpha / params.lambda
                * (params.k.ln() + ((m as f64 - ell) * (n as f64 - ell)).ln())
                + params.beta;
            assert!(rhs >= ell);
        }
    }

    #[test]
    fn test_database_search_space_shrinks() {
        let params = blosum62_gapped(11, 1).unwrap();
        let ss = SearchSpace::for_database_search(250, 100_000, 200, &params);
        assert!(ss.length_adjustment > 0);
        assert!(ss.effective_query_len < 250.0);
        assert!(ss.effective_db_len < 100_000.0);
        assert!((ss.effective_space - ss.effective_query_len * ss.effective_db_len).abs() < 1e-6);
    }

    #[test]
    fn test_tiny_inputs_get_no_adjustment() {
        let params = blosum62_gapped(11, 1).unwrap();
        let adj = compute_length_adjustment(5, 5, 1, &params);
        assert_eq!(adj.length_adjustment, 0);
    }
}
