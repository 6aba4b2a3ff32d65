//! Karlin-Altschul lambda from a score probability distribution
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/blast_stat.c
//!   - Blast_ResFreqStdComp: standard (Robinson) background composition
//!   - BlastScoreFreqCalc: score frequency profile of a matrix
//!   - Blast_KarlinLambdaNR / NlmKarlinLambdaNR: lambda by safeguarded Newton
//!   - BlastKarlinLtoH: relative entropy from lambda

use crate::core::ncbi_math::{gcd, powi};
use crate::utils::matrix::{ncbistdaa, ScoreMatrix, BLASTAA_SIZE};

// NCBI reference: ncbi-blast/c++/include/algo/blast/core/blast_stat.h:121-122
const BLAST_SCORE_MIN: i32 = i16::MIN as i32;
const BLAST_SCORE_MAX: i32 = i16::MAX as i32;
const BLAST_SCORE_RANGE_MAX: i32 = BLAST_SCORE_MAX - BLAST_SCORE_MIN;

// NCBI reference: ncbi-blast/c++/src/algo/blast/core/blast_stat.c:56-72
pub const BLAST_KARLIN_LAMBDA_ACCURACY_DEFAULT: f64 = 1.0e-5;
pub const BLAST_KARLIN_LAMBDA_ITER_DEFAULT: i32 = 17;
pub const BLAST_KARLIN_LAMBDA0_DEFAULT: f64 = 0.5;

/// Robinson & Robinson background frequencies, keyed by NCBISTDAA code
/// Reference: blast_stat.c:1818 STD_AMINO_ACID_FREQS Robinson_prob
const ROBINSON_FREQS: [(u8, f64); 20] = [
    (ncbistdaa::A, 0.07805),
    (ncbistdaa::R, 0.01926),
    (ncbistdaa::N, 0.05364),
    (ncbistdaa::D, 0.06295),
    (ncbistdaa::C, 0.01487),
    (ncbistdaa::Q, 0.03374),
    (ncbistdaa::E, 0.06661),
    (ncbistdaa::G, 0.07129),
    (ncbistdaa::H, 0.02105),
    (ncbistdaa::I, 0.05142),
    (ncbistdaa::L, 0.05744),
    (ncbistdaa::K, 0.05068),
    (ncbistdaa::M, 0.01471),
    (ncbistdaa::F, 0.03965),
    (ncbistdaa::P, 0.04728),
    (ncbistdaa::S, 0.06141),
    (ncbistdaa::T, 0.05506),
    (ncbistdaa::W, 0.01330),
    (ncbistdaa::Y, 0.03216),
    (ncbistdaa::V, 0.06891),
];

/// Standard background composition over NCBISTDAA, normalized to sum 1.
///
/// Reference: Blast_ResFreqStdComp
pub fn std_aa_composition() -> [f64; BLASTAA_SIZE] {
    let mut freq = [0.0; BLASTAA_SIZE];
    for &(residue, p) in ROBINSON_FREQS.iter() {
        freq[residue as usize] = p;
    }
    let sum: f64 = freq.iter().sum();
    for f in freq.iter_mut() {
        *f /= sum;
    }
    freq
}

/// Probability of each score in `[score_min, score_max]`
#[derive(Debug, Clone)]
pub struct ScoreFreqProfile {
    /// `sprob[s - score_min]` is the probability of score `s`
    sprob: Vec<f64>,
    score_min: i32,
    /// Lowest score with non-zero probability
    obs_min: i32,
    /// Highest score with non-zero probability
    obs_max: i32,
    /// Expected score; must be negative for lambda to exist
    score_avg: f64,
}

impl ScoreFreqProfile {
    /// Wrap an already-normalized probability vector, `probs[0]` being the
    /// probability of `min_score`.
    ///
    /// The observed range is the full range, as in blast_kappa.c s_CalcLambda.
    pub fn from_probabilities(probs: &[f64], min_score: i32, max_score: i32) -> Self {
        debug_assert_eq!(probs.len() as i32, max_score - min_score + 1);
        let score_avg = probs
            .iter()
            .enumerate()
            .map(|(i, &p)| (min_score + i as i32) as f64 * p)
            .sum();
        Self {
            sprob: probs.to_vec(),
            score_min: min_score,
            obs_min: min_score,
            obs_max: max_score,
            score_avg,
        }
    }

    /// Score distribution of `matrix` when row residues are drawn from
    /// `comp1` and column residues from `comp2`.
    ///
    /// Reference: blast_stat.c BlastScoreFreqCalc
    pub fn from_compositions(matrix: &ScoreMatrix, comp1: &[f64], comp2: &[f64]) -> Self {
        let size = matrix.size().min(comp1.len()).min(comp2.len());
        let mut score_min = 0;
        let mut score_max = 0;
        for a in 0..size {
            for b in 0..size {
                let s = matrix.score(a as u8, b as u8);
                score_min = score_min.min(s);
                score_max = score_max.max(s);
            }
        }

        let mut sprob = vec![0.0; (score_max - score_min + 1) as usize];
        for a in 0..size {
            if comp1[a] == 0.0 {
                continue;
            }
            for b in 0..size {
                let s = matrix.score(a as u8, b as u8);
                sprob[(s - score_min) as usize] += comp1[a] * comp2[b];
            }
        }

        let mut obs_min = BLAST_SCORE_MIN;
        let mut obs_max = BLAST_SCORE_MIN;
        let mut total = 0.0;
        for (i, &p) in sprob.iter().enumerate() {
            if p > 0.0 {
                let s = score_min + i as i32;
                total += p;
                obs_max = s;
                if obs_min == BLAST_SCORE_MIN {
                    obs_min = s;
                }
            }
        }

        let mut score_avg = 0.0;
        if total.abs() > 0.0001 {
            for (i, p) in sprob.iter_mut().enumerate() {
                *p /= total;
                score_avg += (score_min + i as i32) as f64 * *p;
            }
        }

        Self {
            sprob,
            score_min,
            obs_min,
            obs_max,
            score_avg,
        }
    }

    #[inline]
    pub fn prob(&self, score: i32) -> f64 {
        let idx = score - self.score_min;
        if idx < 0 {
            return 0.0;
        }
        self.sprob.get(idx as usize).copied().unwrap_or(0.0)
    }

    pub fn obs_min(&self) -> i32 {
        self.obs_min
    }

    pub fn obs_max(&self) -> i32 {
        self.obs_max
    }

    pub fn score_avg(&self) -> f64 {
        self.score_avg
    }
}

/// NCBI reference: blast_stat.c:2099-2109 BlastScoreChk
fn score_range_check(lo: i32, hi: i32) -> Result<(), String> {
    if lo >= 0 || hi <= 0 || lo < BLAST_SCORE_MIN || hi > BLAST_SCORE_MAX {
        return Err(format!("invalid score range [{}, {}]", lo, hi));
    }
    if hi - lo > BLAST_SCORE_RANGE_MAX {
        return Err("score range exceeds BLAST_SCORE_RANGE_MAX".to_string());
    }
    Ok(())
}

/// Greatest common divisor of all scores with non-zero probability
fn score_divisor(sfp: &ScoreFreqProfile) -> i32 {
    let low = sfp.obs_min();
    let range = sfp.obs_max() - low;
    let mut d = -low;
    for i in 1..=range {
        if d <= 1 {
            break;
        }
        if sfp.prob(low + i) != 0.0 {
            d = gcd(d, i);
        }
    }
    d
}

/// Solve sum_s p(s) exp(lambda s) = 1 in the variable x = exp(-lambda),
/// mixing Newton steps with bisection on the bracket (0, 1).
///
/// Reference: blast_stat.c:2491-2563 NlmKarlinLambdaNR
#[allow(clippy::too_many_arguments)]
fn nlm_karlin_lambda_nr(
    sfp: &ScoreFreqProfile,
    d: i32,
    low: i32,
    high: i32,
    lambda0: f64,
    tolx: f64,
    itmax: i32,
    max_newton: i32,
) -> f64 {
    let x0 = (-lambda0).exp();
    let mut x = if x0 > 0.0 && x0 < 1.0 { x0 } else { 0.5 };
    let mut a = 0.0;
    let mut b = 1.0;
    let mut f = 4.0;
    let mut is_newton = false;

    for k in 0..itmax {
        let fold = f;
        let was_newton = is_newton;
        is_newton = false;

        // Horner's rule for the polynomial and its derivative
        let mut g = 0.0;
        f = sfp.prob(low);
        let mut i = low + d;
        while i < 0 {
            g = x * g + f;
            f = f * x + sfp.prob(i);
            i += d;
        }
        g = x * g + f;
        f = f * x + sfp.prob(0) - 1.0;
        i = d;
        while i <= high {
            g = x * g + f;
            f = f * x + sfp.prob(i);
            i += d;
        }

        if f > 0.0 {
            a = x;
        } else if f < 0.0 {
            b = x;
        } else {
            break;
        }
        if b - a < 2.0 * a * (1.0 - b) * tolx {
            x = (a + b) / 2.0;
            break;
        }

        if k >= max_newton || (was_newton && f.abs() > 0.9 * fold.abs()) || g >= 0.0 {
            x = (a + b) / 2.0;
        } else {
            let p = -f / g;
            let y = x + p;
            if y <= a || y >= b {
                x = (a + b) / 2.0;
            } else {
                is_newton = true;
                x = y;
                if p.abs() < tolx * x * (1.0 - x) {
                    break;
                }
            }
        }
    }

    -x.ln() / d as f64
}

/// Lambda of a score distribution, starting the search at `lambda0`.
///
/// Fails when the expected score is not negative or the observed range does
/// not straddle zero.
///
/// Reference: blast_stat.c:2567-2598 Blast_KarlinLambdaNR
pub fn karlin_lambda_nr(sfp: &ScoreFreqProfile, lambda0: f64) -> Result<f64, String> {
    let low = sfp.obs_min();
    let high = sfp.obs_max();
    if sfp.score_avg() >= 0.0 {
        return Err("expected score must be negative".to_string());
    }
    score_range_check(low, high)?;

    let d = score_divisor(sfp);
    Ok(nlm_karlin_lambda_nr(
        sfp,
        d,
        low,
        high,
        lambda0,
        BLAST_KARLIN_LAMBDA_ACCURACY_DEFAULT,
        20,
        20 + BLAST_KARLIN_LAMBDA_ITER_DEFAULT,
    ))
}

/// Lambda of the distribution `probs` over `[min_score, max_score]`, or
/// `None` when no positive root exists.
///
/// Reference: blast_kappa.c s_CalcLambda
pub fn calc_lambda(probs: &[f64], min_score: i32, max_score: i32, lambda0: f64) -> Option<f64> {
    let sfp = ScoreFreqProfile::from_probabilities(probs, min_score, max_score);
    karlin_lambda_nr(&sfp, lambda0).ok().filter(|l| l.is_finite() && *l > 0.0)
}

/// Relative entropy H of the distribution at `lambda`.
///
/// Reference: blast_stat.c:2607-2633 BlastKarlinLtoH
pub fn karlin_lambda_to_h(sfp: &ScoreFreqProfile, lambda: f64) -> Result<f64, String> {
    if lambda < 0.0 {
        return Err("lambda must be non-negative".to_string());
    }
    let low = sfp.obs_min();
    let high = sfp.obs_max();
    score_range_check(low, high)?;

    let etonlam = (-lambda).exp();
    let mut sum = low as f64 * sfp.prob(low);
    for score in (low + 1)..=high {
        sum = score as f64 * sfp.prob(score) + etonlam * sum;
    }

    match powi(etonlam, high) {
        Some(scale) if scale > 0.0 => Ok(lambda * sum / scale),
        // Underflow; use the log form
        _ => Ok(lambda * (lambda * high as f64 + sum.ln()).exp()),
    }
}
