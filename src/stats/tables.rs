//! Precomputed Karlin-Altschul parameters for BLOSUM62
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/blast_stat.c blosum62_values

/// Karlin-Altschul statistical parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KarlinParams {
    /// Lambda parameter for bit score calculation
    pub lambda: f64,
    /// K parameter for E-value calculation
    pub k: f64,
    /// H parameter (entropy) for length adjustment
    pub h: f64,
    /// Alpha parameter for length correction mean
    pub alpha: f64,
    /// Beta parameter for length correction
    pub beta: f64,
}

impl KarlinParams {
    #[inline]
    pub fn log_k(&self) -> f64 {
        self.k.ln()
    }
}

/// One row of the parameter table: (gap_open, gap_extend, lambda, k, h, alpha, beta)
#[derive(Debug, Clone, Copy)]
struct ParamEntry {
    gap_open: i32,
    gap_extend: i32,
    params: KarlinParams,
}

impl ParamEntry {
    const fn new(gap_open: i32, gap_extend: i32, lambda: f64, k: f64, h: f64, alpha: f64, beta: f64) -> Self {
        Self {
            gap_open,
            gap_extend,
            params: KarlinParams {
                lambda,
                k,
                h,
                alpha,
                beta,
            },
        }
    }
}

/// BLOSUM62; the first row (gap costs MAX) holds the ungapped values
const BLOSUM62: &[ParamEntry] = &[
    ParamEntry::new(i32::MAX, i32::MAX, 0.3176, 0.134, 0.4012, 0.7916, -3.2),
    ParamEntry::new(11, 2, 0.297, 0.082, 0.27, 1.1, -10.0),
    ParamEntry::new(10, 2, 0.291, 0.075, 0.23, 1.3, -15.0),
    ParamEntry::new(9, 2, 0.279, 0.058, 0.19, 1.5, -19.0),
    ParamEntry::new(8, 2, 0.264, 0.045, 0.15, 1.8, -26.0),
    ParamEntry::new(7, 2, 0.239, 0.027, 0.10, 2.5, -46.0),
    ParamEntry::new(6, 2, 0.201, 0.012, 0.061, 3.3, -58.0),
    ParamEntry::new(13, 1, 0.292, 0.071, 0.23, 1.2, -11.0),
    ParamEntry::new(12, 1, 0.283, 0.059, 0.19, 1.5, -19.0),
    ParamEntry::new(11, 1, 0.267, 0.041, 0.14, 1.9, -30.0),
    ParamEntry::new(10, 1, 0.243, 0.024, 0.10, 2.5, -44.0),
    ParamEntry::new(9, 1, 0.206, 0.010, 0.052, 4.0, -87.0),
];

/// Ungapped BLOSUM62 parameters (NCBI kbp_ideal / kbp_std)
pub fn blosum62_ungapped() -> KarlinParams {
    BLOSUM62[0].params
}

/// Gapped BLOSUM62 parameters, or `None` for an unsupported gap cost pair.
///
/// Reference: blast_stat.c Blast_KarlinBlkGappedLoadFromTables
pub fn blosum62_gapped(gap_open: i32, gap_extend: i32) -> Option<KarlinParams> {
    BLOSUM62
        .iter()
        .skip(1)
        .find(|e| e.gap_open == gap_open && e.gap_extend == gap_extend)
        .map(|e| e.params)
}

/// Gap cost pairs with precomputed gapped statistics
pub fn blosum62_supported_gap_costs() -> impl Iterator<Item = (i32, i32)> {
    BLOSUM62.iter().skip(1).map(|e| (e.gap_open, e.gap_extend))
}
