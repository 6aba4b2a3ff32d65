//! Unit tests for algorithm/common/diagnostics.rs

use blastcore::algorithm::common::diagnostics::{diagnostics_enabled, RedoDiagnostics, ScanDiagnostics};
use std::env;
use std::sync::atomic::Ordering;

#[test]
fn test_diagnostics_enabled() {
    env::remove_var("BLASTCORE_DIAGNOSTICS");
    assert!(!diagnostics_enabled());

    env::set_var("BLASTCORE_DIAGNOSTICS", "1");
    assert!(diagnostics_enabled());

    env::set_var("BLASTCORE_DIAGNOSTICS", "TRUE");
    assert!(diagnostics_enabled());

    env::set_var("BLASTCORE_DIAGNOSTICS", "0");
    assert!(!diagnostics_enabled());

    env::remove_var("BLASTCORE_DIAGNOSTICS");
}

#[test]
fn test_scan_counters_start_at_zero() {
    let counters = ScanDiagnostics::default();
    assert_eq!(counters.subjects_scanned.load(Ordering::Relaxed), 0);
    assert_eq!(counters.word_hits.load(Ordering::Relaxed), 0);
    assert_eq!(counters.scan_restarts.load(Ordering::Relaxed), 0);
    assert_eq!(counters.gapped_candidates.load(Ordering::Relaxed), 0);
}

#[test]
fn test_redo_counters_shared_across_threads() {
    let counters = RedoDiagnostics::default();
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..100 {
                    counters.record_window();
                    counters.record_adjustment(false);
                }
            });
        }
    });
    assert_eq!(counters.windows.load(Ordering::Relaxed), 400);
    assert_eq!(counters.lambda_failures.load(Ordering::Relaxed), 400);
    assert_eq!(counters.matrices_adjusted.load(Ordering::Relaxed), 0);
}
