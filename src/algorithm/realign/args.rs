//! Command-line arguments for the realigning protein search

use clap::Args;
use std::path::PathBuf;

use super::constants::{GAP_EXTEND, GAP_OPEN, TWO_HIT_WINDOW};

/// Protein queries vs protein subjects with composition-adjusted realignment
#[derive(Args, Debug)]
pub struct RealignArgs {
    #[arg(short, long)]
    pub query: PathBuf,
    #[arg(short, long)]
    pub subject: PathBuf,
    #[arg(short, long, default_value_t = 10.0)]
    pub evalue: f64,
    #[arg(short, long, default_value_t = 11)]
    pub threshold: i32,
    #[arg(short, long, default_value_t = 3)]
    pub word_size: usize,
    #[arg(short = 'n', long, default_value_t = 0)]
    pub num_threads: usize,
    #[arg(short, long)]
    pub out: Option<PathBuf>,
    #[arg(long, default_value_t = 500)]
    pub max_target_seqs: usize,
    #[arg(long, default_value_t = GAP_OPEN)]
    pub gap_open: i32,
    #[arg(long, default_value_t = GAP_EXTEND)]
    pub gap_extend: i32,

    /// Composition-based statistics: 0 = off, 1 = rescale the matrix per subject window
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=1))]
    pub comp_based_stats: u8,

    /// Recompute alignments with repeated Smith-Waterman passes instead of
    /// re-extending from the preliminary alignments
    #[arg(long, default_value_t = false)]
    pub smith_waterman: bool,

    /// Two-hit window size for triggering ungapped extension (default: 40)
    /// Use 0 to enable one-hit mode
    #[arg(long, default_value_t = TWO_HIT_WINDOW)]
    pub window_size: usize,

    /// Subjects processed per batch between heap updates
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,
}
