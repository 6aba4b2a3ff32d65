//! Diagnostic counters for the scan and realign pipelines
//!
//! Tracks where word hits and candidate alignments are lost. Enabled via the
//! BLASTCORE_DIAGNOSTICS environment variable; counters are atomics so worker
//! threads can share one instance.

use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

/// Check if diagnostics are enabled via environment variable
pub fn diagnostics_enabled() -> bool {
    std::env::var("BLASTCORE_DIAGNOSTICS")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

#[inline]
fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, AtomicOrdering::Relaxed);
}

#[inline]
fn load(counter: &AtomicUsize) -> usize {
    counter.load(AtomicOrdering::Relaxed)
}

/// Seed stage counters
#[derive(Default)]
pub struct ScanDiagnostics {
    pub subjects_scanned: AtomicUsize,
    pub word_hits: AtomicUsize,
    /// Scan calls that stopped early because the offset array filled up
    pub scan_restarts: AtomicUsize,
    /// Hits skipped because an earlier extension already covered them
    pub hits_on_covered_diagonal: AtomicUsize,
    pub ungapped_extensions: AtomicUsize,
    pub ungapped_low_score: AtomicUsize,
    pub gapped_candidates: AtomicUsize,
}

impl ScanDiagnostics {
    pub fn add_word_hits(&self, n: usize) {
        self.word_hits.fetch_add(n, AtomicOrdering::Relaxed);
    }

    pub fn record_subject(&self) {
        bump(&self.subjects_scanned);
    }

    pub fn record_restart(&self) {
        bump(&self.scan_restarts);
    }

    pub fn record_covered_hit(&self) {
        bump(&self.hits_on_covered_diagonal);
    }

    pub fn record_ungapped(&self, passed: bool) {
        bump(&self.ungapped_extensions);
        if !passed {
            bump(&self.ungapped_low_score);
        }
    }

    pub fn record_gapped_candidate(&self) {
        bump(&self.gapped_candidates);
    }

    pub fn print_summary(&self) {
        eprintln!("\n=== Seed Stage Diagnostics ===");
        eprintln!("  Subjects scanned:           {}", load(&self.subjects_scanned));
        eprintln!("  Word hits:                  {}", load(&self.word_hits));
        eprintln!("  Scan restarts (array full): {}", load(&self.scan_restarts));
        eprintln!("  Hits on covered diagonals:  {}", load(&self.hits_on_covered_diagonal));
        eprintln!("  Ungapped extensions:        {}", load(&self.ungapped_extensions));
        eprintln!("  Ungapped below trigger:     {}", load(&self.ungapped_low_score));
        eprintln!("  Gapped candidates:          {}", load(&self.gapped_candidates));
        eprintln!("==============================\n");
    }
}

/// Redo engine counters
#[derive(Default)]
pub struct RedoDiagnostics {
    pub windows: AtomicUsize,
    pub matrices_adjusted: AtomicUsize,
    /// Windows where no lambda could be found and the unadjusted matrix was used
    pub lambda_failures: AtomicUsize,
    pub alignments_redone: AtomicUsize,
    /// Candidates the alignment callback declined (algorithmic failure)
    pub candidates_failed: AtomicUsize,
    /// Candidates whose start already lies inside a new alignment
    pub candidates_contained: AtomicUsize,
    pub below_cutoff: AtomicUsize,
    pub sw_alignments: AtomicUsize,
    pub early_terminations: AtomicUsize,
}

impl RedoDiagnostics {
    pub fn record_window(&self) {
        bump(&self.windows);
    }

    pub fn record_adjustment(&self, succeeded: bool) {
        if succeeded {
            bump(&self.matrices_adjusted);
        } else {
            bump(&self.lambda_failures);
        }
    }

    pub fn record_redone(&self) {
        bump(&self.alignments_redone);
    }

    pub fn record_failed(&self) {
        bump(&self.candidates_failed);
    }

    pub fn record_contained(&self) {
        bump(&self.candidates_contained);
    }

    pub fn record_below_cutoff(&self) {
        bump(&self.below_cutoff);
    }

    pub fn record_sw_alignment(&self) {
        bump(&self.sw_alignments);
    }

    pub fn record_early_termination(&self) {
        bump(&self.early_terminations);
    }

    pub fn print_summary(&self) {
        eprintln!("\n=== Redo Engine Diagnostics ===");
        eprintln!("  Windows:                    {}", load(&self.windows));
        eprintln!("  Matrices adjusted:          {}", load(&self.matrices_adjusted));
        eprintln!("  Lambda failures:            {}", load(&self.lambda_failures));
        eprintln!("  Alignments redone:          {}", load(&self.alignments_redone));
        eprintln!("  Candidates failed:          {}", load(&self.candidates_failed));
        eprintln!("  Candidates contained:       {}", load(&self.candidates_contained));
        eprintln!("  Below score cutoff:         {}", load(&self.below_cutoff));
        eprintln!("  Smith-Waterman alignments:  {}", load(&self.sw_alignments));
        eprintln!("  Early terminations:         {}", load(&self.early_terminations));
        eprintln!("===============================\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redo_counters_accumulate() {
        let diag = RedoDiagnostics::default();
        diag.record_window();
        diag.record_adjustment(true);
        diag.record_adjustment(false);
        diag.record_failed();
        assert_eq!(load(&diag.windows), 1);
        assert_eq!(load(&diag.matrices_adjusted), 1);
        assert_eq!(load(&diag.lambda_failures), 1);
        assert_eq!(load(&diag.candidates_failed), 1);
    }

    #[test]
    fn test_scan_counters_accumulate() {
        let diag = ScanDiagnostics::default();
        diag.add_word_hits(7);
        diag.record_ungapped(true);
        diag.record_ungapped(false);
        assert_eq!(load(&diag.word_hits), 7);
        assert_eq!(load(&diag.ungapped_extensions), 2);
        assert_eq!(load(&diag.ungapped_low_score), 1);
    }
}
