//! Command-line arguments for the word scan

use clap::Args;
use std::path::PathBuf;

/// Index the queries and report every word hit in the subjects
#[derive(Args, Debug)]
pub struct ScanArgs {
    #[arg(short, long)]
    pub query: PathBuf,
    #[arg(short, long)]
    pub subject: PathBuf,
    /// Neighborhood word score threshold; 0 reports exact word matches only
    #[arg(short, long, default_value_t = 11)]
    pub threshold: i32,
    #[arg(short, long, default_value_t = 3)]
    pub word_size: usize,
    /// Offset pairs collected per scan call before they are drained
    #[arg(long, default_value_t = crate::core::aa_scan::OFFSET_ARRAY_SIZE)]
    pub array_size: usize,
    #[arg(short = 'n', long, default_value_t = 0)]
    pub num_threads: usize,
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}
