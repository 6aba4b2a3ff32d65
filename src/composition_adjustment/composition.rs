//! Amino acid composition and composition-based matrix rescaling
//!
//! Reference: ncbi-blast/c++/src/algo/blast/composition_adjustment/
//!   composition_adjustment.c Blast_ReadAaComposition / Blast_CompositionBasedStats
//!   matrix_frequency_data.c (BLOSUM62 lambda)

use crate::utils::matrix::{ScoreMatrix, BLASTAA_SIZE};

/// NCBISTDAA codes of the 20 standard amino acids
pub const TRUE_CHAR_POSITIONS: [u8; 20] = [1, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 22];

/// Lower bound on the lambda ratio applied to the matrix
pub const LAMBDA_RATIO_LOWER_BOUND: f64 = 0.5;

/// Ungapped lambda of unscaled BLOSUM62 under the standard background
// [C] composition_adjustment/matrix_frequency_data.c BLOSUM62 lambda
pub const BLOSUM62_UNGAPPED_LAMBDA: f64 = 0.3176;

/// Residue frequencies over NCBISTDAA, counting only standard residues
#[derive(Debug, Clone, PartialEq)]
pub struct AminoAcidComposition {
    pub prob: [f64; BLASTAA_SIZE],
    /// Standard residues seen; zero means `prob` is all zeros
    pub num_true_amino_acids: usize,
}

impl Default for AminoAcidComposition {
    fn default() -> Self {
        Self {
            prob: [0.0; BLASTAA_SIZE],
            num_true_amino_acids: 0,
        }
    }
}

#[inline]
fn is_true_char(residue: u8) -> bool {
    TRUE_CHAR_POSITIONS.binary_search(&residue).is_ok()
}

impl AminoAcidComposition {
    /// Reference: composition_adjustment.c Blast_ReadAaComposition
    pub fn from_residues(residues: &[u8]) -> Self {
        let mut comp = Self::default();
        for &r in residues {
            if is_true_char(r) {
                comp.prob[r as usize] += 1.0;
                comp.num_true_amino_acids += 1;
            }
        }
        if comp.num_true_amino_acids > 0 {
            let n = comp.num_true_amino_acids as f64;
            for p in comp.prob.iter_mut() {
                *p /= n;
            }
        }
        comp
    }
}

/// Score distribution of the standard-residue submatrix of `matrix` with
/// rows drawn from `row_prob` and columns from `col_prob`.
///
/// Returns (probabilities indexed from `min`, `min`, `max`), or `None`
/// when either composition has no standard residues.
///
/// Reference: composition_adjustment.c s_GetMatrixScoreProbs
pub fn score_probabilities(matrix: &ScoreMatrix, row_prob: &[f64], col_prob: &[f64]) -> Option<(Vec<f64>, i32, i32)> {
    let (min, max) = matrix.score_range(&TRUE_CHAR_POSITIONS);
    let mut probs = vec![0.0; (max - min + 1) as usize];
    for &a in TRUE_CHAR_POSITIONS.iter() {
        let pa = row_prob[a as usize];
        if pa == 0.0 {
            continue;
        }
        for &b in TRUE_CHAR_POSITIONS.iter() {
            probs[(matrix.score(a, b) - min) as usize] += pa * col_prob[b as usize];
        }
    }
    let sum: f64 = probs.iter().sum();
    if sum <= 0.0 {
        return None;
    }
    for p in probs.iter_mut() {
        *p /= sum;
    }
    Some((probs, min, max))
}

/// Composition adjustment modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompoAdjustMode {
    /// Keep the scaled start matrix for every subject
    NoAdjustment,
    /// Rescale the matrix by the ratio of the composition lambda to the
    /// standard lambda (mode 1)
    #[default]
    CompositionBasedStats,
}

/// The search's scoring matrix in both unscaled and scaled form
///
/// Reference: composition_adjustment.h Blast_MatrixInfo
#[derive(Debug, Clone)]
pub struct MatrixInfo {
    pub matrix_name: String,
    /// Unscaled integer matrix
    pub start_matrix: ScoreMatrix,
    /// `start_matrix` multiplied by `scaling_factor`
    pub scaled_matrix: ScoreMatrix,
    pub scaling_factor: f64,
    /// Ungapped lambda of the unscaled matrix
    pub ungapped_lambda: f64,
}

impl MatrixInfo {
    pub fn blosum62(scaling_factor: f64) -> Self {
        let start_matrix = ScoreMatrix::blosum62();
        let scaled_matrix = start_matrix.scaled(scaling_factor);
        Self {
            matrix_name: "BLOSUM62".to_string(),
            start_matrix,
            scaled_matrix,
            scaling_factor,
            ungapped_lambda: BLOSUM62_UNGAPPED_LAMBDA,
        }
    }
}

/// Scratch state for one worker thread; reused across subjects
#[derive(Debug, Clone)]
pub struct CompositionWorkspace {
    /// Matrix in effect for the current window
    pub matrix: ScoreMatrix,
    pub subject_composition: AminoAcidComposition,
    /// Ratio applied by the last adjustment, 1.0 when unadjusted
    pub lambda_ratio: f64,
}

impl CompositionWorkspace {
    pub fn new(matrix_info: &MatrixInfo) -> Self {
        Self {
            matrix: matrix_info.scaled_matrix.clone(),
            subject_composition: AminoAcidComposition::default(),
            lambda_ratio: 1.0,
        }
    }

    /// Put the plain scaled matrix back in effect
    pub fn reset(&mut self, matrix_info: &MatrixInfo) {
        self.matrix.clone_from(&matrix_info.scaled_matrix);
        self.lambda_ratio = 1.0;
    }
}

/// Rescale the matrix for the pair of compositions.
///
/// Computes the ungapped lambda of the unscaled start matrix under
/// (query, subject) composition, clamps its ratio to the standard lambda
/// into [0.5, 1] and writes `start * scaling_factor * ratio` into the
/// workspace. Returns the ratio, or `None` when no lambda exists, in which
/// case the workspace holds the unadjusted scaled matrix.
///
/// Reference: composition_adjustment.c Blast_CompositionBasedStats
pub fn composition_based_stats<F>(
    workspace: &mut CompositionWorkspace,
    matrix_info: &MatrixInfo,
    query_comp: &AminoAcidComposition,
    subject_comp: &AminoAcidComposition,
    calc_lambda: F,
) -> Option<f64>
where
    F: FnOnce(&[f64], i32, i32, f64) -> Option<f64>,
{
    let computed = score_probabilities(&matrix_info.start_matrix, &query_comp.prob, &subject_comp.prob)
        .and_then(|(probs, min, max)| calc_lambda(&probs, min, max, matrix_info.ungapped_lambda));

    let lambda = match computed {
        Some(l) if l > 0.0 => l,
        _ => {
            workspace.reset(matrix_info);
            return None;
        }
    };

    // [C] if (0 == pValueAdjustment) *LambdaRatio = MIN(1, *LambdaRatio);
    //     *LambdaRatio = MAX(*LambdaRatio, LambdaRatioLowerBound);
    let ratio = (lambda / matrix_info.ungapped_lambda)
        .min(1.0)
        .max(LAMBDA_RATIO_LOWER_BOUND);
    workspace
        .matrix
        .assign_scaled(&matrix_info.start_matrix, matrix_info.scaling_factor * ratio);
    workspace.lambda_ratio = ratio;
    Some(ratio)
}
