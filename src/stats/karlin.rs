use super::tables::KarlinParams;
use std::f64::consts::LN_2;

/// Bit score of a raw score: S' = (lambda * S - ln K) / ln 2
///
/// Reference: ncbi-blast/c++/src/algo/blast/core/blast_kappa.c:113
/// hsp->bit_score = (hsp->score*lambda*scoreDivisor - logK)/NCBIMATH_LN2;
pub fn bit_score(raw_score: i32, params: &KarlinParams) -> f64 {
    (params.lambda * raw_score as f64 - params.log_k()) / LN_2
}

/// E-value straight from a raw score: E = eff_space * exp(ln K - lambda * S).
///
/// Works with scaled scores as long as `lambda` is scaled the same way.
///
/// Reference: blast_stat.c BLAST_KarlinStoE_simple
pub fn evalue_from_raw(raw_score: f64, lambda: f64, log_k: f64, effective_space: f64) -> f64 {
    effective_space * (log_k - lambda * raw_score).exp()
}

/// Smallest raw score whose E-value is at most `e_value`.
///
/// Reference: blast_stat.c BLAST_Cutoffs
pub fn raw_score_from_evalue(e_value: f64, params: &KarlinParams, effective_space: f64) -> i32 {
    if e_value <= 0.0 {
        return i32::MAX;
    }
    let score = (params.log_k() + effective_space.ln() - e_value.ln()) / params.lambda;
    score.ceil().max(1.0) as i32
}
