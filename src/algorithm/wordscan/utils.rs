//! Main execution logic for the word scan

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};

use super::args::ScanArgs;
use crate::algorithm::common::diagnostics::{diagnostics_enabled, ScanDiagnostics};
use crate::algorithm::common::queries::{build_lookup, read_fasta, record_id, QuerySet};
use crate::core::aa_lookup::{LookupOptions, LookupTable};
use crate::core::aa_scan::{offset_array_size, scan_finished, scan_subject, OffsetPair};
use crate::utils::matrix::{encode_protein, ScoreMatrix};

/// One word hit in query-local coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordHit {
    pub query_index: usize,
    pub q_off: usize,
    pub s_off: usize,
}

/// All word hits of `subject`, in scan order. The offset array is drained
/// and the scan resumed whenever it fills up.
pub fn collect_word_hits(
    table: &LookupTable,
    queries: &QuerySet,
    subject: &[u8],
    pairs: &mut [OffsetPair],
    diag: Option<&ScanDiagnostics>,
) -> Vec<WordHit> {
    let mut hits = Vec::new();
    let mut start = 0usize;
    while !scan_finished(table, subject, start) {
        let n = scan_subject(table, subject, &mut start, pairs);
        if let Some(d) = diag {
            d.add_word_hits(n);
            if !scan_finished(table, subject, start) {
                d.record_restart();
            }
        }
        hits.extend(pairs[..n].iter().filter_map(|p| {
            queries.locate(p.q_off as usize).map(|(query_index, q_off)| WordHit {
                query_index,
                q_off,
                s_off: p.s_off as usize,
            })
        }));
    }
    hits
}

pub fn run(args: ScanArgs) -> Result<()> {
    let num_threads = if args.num_threads == 0 {
        num_cpus::get()
    } else {
        args.num_threads
    };
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .context("Failed to build thread pool")?;

    let diag_enabled = diagnostics_enabled();
    let diagnostics = ScanDiagnostics::default();

    eprintln!("Reading queries...");
    let query_records = read_fasta(&args.query)?;
    let queries = QuerySet::from_records(&query_records);

    eprintln!("Building lookup table...");
    let matrix = ScoreMatrix::blosum62();
    let options = LookupOptions {
        word_size: args.word_size,
        ..LookupOptions::protein(args.threshold)
    };
    let table = build_lookup(&queries, options, &matrix)?;

    eprintln!("Reading subject file...");
    let subject_records = read_fasta(&args.subject)?;
    if queries.is_empty() || subject_records.is_empty() {
        return Ok(());
    }

    eprintln!("Scanning {} Queries vs {} Subjects...", queries.len(), subject_records.len());
    let bar = ProgressBar::new(subject_records.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress bar template")?,
    );

    let array_size = offset_array_size(&table, args.array_size);
    let diag_ref = if diag_enabled { Some(&diagnostics) } else { None };
    let per_subject: Vec<Vec<WordHit>> = subject_records
        .par_iter()
        .map_init(
            || vec![OffsetPair::default(); array_size],
            |pairs, record| {
                let subject = encode_protein(record.seq());
                if let Some(d) = diag_ref {
                    d.record_subject();
                }
                let hits = collect_word_hits(&table, &queries, &subject, pairs, diag_ref);
                bar.inc(1);
                hits
            },
        )
        .collect();
    bar.finish_with_message("Done");

    let stdout = io::stdout();
    let mut writer: Box<dyn Write> = match args.out.as_ref() {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(stdout.lock())),
    };
    write_word_hits(&mut writer, &queries, &subject_records, &per_subject)?;
    writer.flush()?;

    if diag_enabled {
        diagnostics.print_summary();
    }
    Ok(())
}

fn write_word_hits<W: Write>(
    writer: &mut W,
    queries: &QuerySet,
    subject_records: &[bio::io::fasta::Record],
    per_subject: &[Vec<WordHit>],
) -> Result<()> {
    for (record, hits) in subject_records.iter().zip(per_subject) {
        let subject_id = record_id(record);
        for hit in hits {
            writeln!(writer, "{}\t{}\t{}\t{}", queries.ids[hit.query_index], subject_id, hit.q_off, hit.s_off)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bio::io::fasta::Record;

    #[test]
    fn test_collect_word_hits_across_refills() {
        let records = vec![Record::with_attrs("q", None, b"ACDEFGHIK")];
        let queries = QuerySet::from_records(&records);
        let matrix = ScoreMatrix::blosum62();
        let table = build_lookup(&queries, LookupOptions::protein(0), &matrix).unwrap();
        let subject = encode_protein(b"XXACDEFGHIKXX");

        // Room for one pair at a time forces a restart per hit
        let mut pairs = vec![OffsetPair::default(); offset_array_size(&table, 1)];
        let diag = ScanDiagnostics::default();
        let hits = collect_word_hits(&table, &queries, &subject, &mut pairs, Some(&diag));

        assert_eq!(hits.len(), 7);
        for (i, hit) in hits.iter().enumerate() {
            assert_eq!(hit.query_index, 0);
            assert_eq!(hit.q_off, i);
            assert_eq!(hit.s_off, i + 2);
        }
        assert_eq!(diag.word_hits.load(std::sync::atomic::Ordering::Relaxed), 7);
    }
}
