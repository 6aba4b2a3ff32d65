//! Main execution logic for the realigning protein search
//!
//! Subjects are processed in batches. Within a batch every subject is
//! seeded, aligned and realigned in parallel against a read-only snapshot of
//! the per-query heaps; the results are then merged into the heaps on the
//! main thread in subject order, so output does not depend on thread count.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use super::args::RealignArgs;
use super::constants::{COMPO_SCALING_FACTOR, X_DROP_GAPPED_FINAL_BITS};
use super::extension::{find_ungapped_hsps, preliminary_gapped_alignments, DiagonalTracker, SeedParams};
use crate::algorithm::common::diagnostics::{diagnostics_enabled, RedoDiagnostics, ScanDiagnostics};
use crate::algorithm::common::queries::{build_lookup, encode_with_sentinel, read_fasta, record_id, QuerySet};
use crate::align::{EditScript, GapScoring};
use crate::common::{score_compare_hsps, write_output, Hit};
use crate::composition_adjustment::{
    early_termination_all, protein_redo_params, redo_one_match, redo_one_match_smith_waterman, Alignment, AlignmentList,
    CompoAdjustMode, CompoHeap, CompositionWorkspace, ForbiddenRanges, HeapEntry, MatchingSequence, MatrixInfo, ProteinRedo,
    QueryInfo, RedoAlignParams, SequenceData,
};
use crate::core::aa_lookup::{LookupOptions, LookupTable};
use crate::core::aa_scan::{offset_array_size, OffsetPair, OFFSET_ARRAY_SIZE};
use crate::stats::karlin::{bit_score, evalue_from_raw, raw_score_from_evalue};
use crate::stats::search_space::SearchSpace;
use crate::stats::tables::{blosum62_gapped, blosum62_ungapped, KarlinParams};
use crate::utils::matrix::ScoreMatrix;

/// Read-only state shared by every worker
pub struct SearchContext<'a> {
    pub table: &'a LookupTable,
    pub queries: &'a QuerySet,
    pub query_infos: &'a [QueryInfo<'a>],
    pub matrix: &'a ScoreMatrix,
    pub seed_params: SeedParams,
    pub gap_open: i32,
    pub gap_extend: i32,
    pub gapped: KarlinParams,
    pub redo_params: RedoAlignParams<ProteinRedo>,
    pub smith_waterman: bool,
    pub scan_diag: Option<&'a ScanDiagnostics>,
    pub redo_diag: Option<&'a RedoDiagnostics>,
}

/// Per-thread scratch space
pub struct Worker {
    workspace: CompositionWorkspace,
    forbidden: ForbiddenRanges,
    pairs: Vec<OffsetPair>,
    tracker: DiagonalTracker,
}

impl Worker {
    pub fn new(ctx: &SearchContext<'_>) -> Self {
        Self {
            workspace: CompositionWorkspace::new(&ctx.redo_params.matrix_info),
            forbidden: ForbiddenRanges::default(),
            pairs: vec![OffsetPair::default(); offset_array_size(ctx.table, OFFSET_ARRAY_SIZE)],
            tracker: DiagonalTracker::new(),
        }
    }
}

/// One subject's hits for one query
pub type SubjectHits = Vec<Hit>;

/// Subject given as residues preceded by a sentinel
pub struct SubjectInput<'a> {
    pub index: usize,
    pub id: &'a str,
    pub encoded: &'a [u8],
}

/// Seed, align and realign one subject against all queries. Returns one
/// heap candidate per query that has a significant alignment.
pub fn realign_subject<P>(
    ctx: &SearchContext<'_>,
    worker: &mut Worker,
    subject: &SubjectInput<'_>,
    heaps: &[CompoHeap<P>],
) -> Result<Vec<(usize, HeapEntry<SubjectHits>)>> {
    let residues = &subject.encoded[1..];
    if let Some(d) = ctx.scan_diag {
        d.record_subject();
    }

    let seeds = find_ungapped_hsps(
        ctx.table,
        ctx.queries,
        residues,
        ctx.matrix,
        &ctx.seed_params,
        &mut worker.pairs,
        &mut worker.tracker,
        ctx.scan_diag,
    );
    if seeds.is_empty() {
        return Ok(Vec::new());
    }

    let scoring = GapScoring {
        matrix: ctx.matrix,
        gap_open: ctx.gap_open,
        gap_extend: ctx.gap_extend,
        decline_align: i32::MAX / 4,
    };
    let log_k = ctx.gapped.log_k();
    let cutoff_e = ctx.redo_params.cutoff_e;
    let prelim: Vec<Alignment<EditScript>> =
        preliminary_gapped_alignments(ctx.queries, residues, &scoring, &ctx.seed_params, seeds, ctx.scan_diag)
            .into_iter()
            .filter(|a| {
                let eff = ctx.query_infos[a.query_index].eff_search_space;
                evalue_from_raw(a.score as f64, ctx.gapped.lambda, log_k, eff) <= cutoff_e
            })
            .collect();
    let Some(best_evalue) = prelim
        .iter()
        .map(|a| evalue_from_raw(a.score as f64, ctx.gapped.lambda, log_k, ctx.query_infos[a.query_index].eff_search_space))
        .min_by(|a, b| a.total_cmp(b))
    else {
        return Ok(Vec::new());
    };

    // [C] blast_kappa.c: skip the subject when no heap can take its best match
    if early_termination_all(best_evalue, heaps) {
        if let Some(d) = ctx.redo_diag {
            d.record_early_termination();
        }
        return Ok(Vec::new());
    }

    // Alignments were produced best first; the list keeps the newest in front
    let incoming: AlignmentList<EditScript> = prelim.into_iter().rev().collect();
    let matching = MatchingSequence::new(subject.index, SequenceData::borrowed(subject.encoded));
    let redone = if ctx.smith_waterman {
        redo_one_match_smith_waterman(
            &ctx.redo_params,
            &mut worker.workspace,
            &mut worker.forbidden,
            &incoming,
            &matching,
            ctx.query_infos,
            Some(heaps),
            ctx.redo_diag,
        )
    } else {
        redo_one_match(&ctx.redo_params, &mut worker.workspace, &incoming, &matching, ctx.query_infos, ctx.redo_diag)
    }
    .with_context(|| format!("Failed to realign subject {}", subject.id))?;

    let mut out = Vec::new();
    for (query_index, list) in redone.into_iter().enumerate() {
        if list.is_empty() {
            continue;
        }
        let hits = alignments_to_hits(ctx, query_index, subject, list);
        if let Some(entry) = heap_entry(subject.index, hits) {
            out.push((query_index, entry));
        }
    }
    Ok(out)
}

fn alignments_to_hits(
    ctx: &SearchContext<'_>,
    query_index: usize,
    subject: &SubjectInput<'_>,
    list: AlignmentList<EditScript>,
) -> SubjectHits {
    let scale = ctx.redo_params.matrix_info.scaling_factor;
    let query_info = &ctx.query_infos[query_index];
    let mut hits: SubjectHits = list
        .into_vec()
        .into_iter()
        .filter_map(|a| {
            let e_value = ctx.redo_params.evalue(a.score, query_info);
            if e_value > ctx.redo_params.cutoff_e {
                return None;
            }
            let stats = a.context.as_ref().map(EditScript::stats).unwrap_or_default();
            Some(Hit {
                query_id: ctx.queries.ids[query_index].clone(),
                subject_id: subject.id.to_string(),
                identity: stats.identity(),
                length: stats.alignment_len,
                mismatch: stats.mismatches,
                gapopen: stats.gap_opens,
                q_start: a.query_start + 1,
                q_end: a.query_end,
                s_start: a.match_start + 1,
                s_end: a.match_end,
                e_value,
                bit_score: bit_score(a.normalized_score(scale), &ctx.gapped),
                q_idx: query_index as u32,
                s_idx: subject.index as u32,
                raw_score: a.score,
            })
        })
        .collect();
    hits.sort_by(score_compare_hsps);
    hits
}

/// Heap record keyed by the subject's best hit
fn heap_entry(subject_index: usize, hits: SubjectHits) -> Option<HeapEntry<SubjectHits>> {
    let best = hits.first()?;
    let evalue = hits.iter().map(|h| h.e_value).fold(f64::INFINITY, f64::min);
    Some(HeapEntry {
        evalue,
        score: best.raw_score,
        subject_index,
        payload: hits,
    })
}

/// Smallest score any query could report at `cutoff_e`
fn min_cutoff_score(query_infos: &[QueryInfo<'_>], gapped: &KarlinParams, cutoff_e: f64) -> i32 {
    query_infos
        .iter()
        .map(|q| raw_score_from_evalue(cutoff_e, gapped, q.eff_search_space))
        .min()
        .unwrap_or(1)
        .max(1)
}

pub fn run(args: RealignArgs) -> Result<()> {
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
    let scan_diagnostics = ScanDiagnostics::default();
    let redo_diagnostics = RedoDiagnostics::default();

    let ungapped = blosum62_ungapped();
    let gapped = blosum62_gapped(args.gap_open, args.gap_extend).with_context(|| {
        format!("Gap costs {}/{} are not supported for BLOSUM62", args.gap_open, args.gap_extend)
    })?;

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
    let subject_ids: Vec<String> = subject_records.iter().map(record_id).collect();
    let encoded_subjects: Vec<Vec<u8>> = subject_records.par_iter().map(|r| encode_with_sentinel(r.seq())).collect();
    let db_len: usize = encoded_subjects.iter().map(|s| s.len() - 1).sum();
    let num_seqs = encoded_subjects.len();

    let query_infos: Vec<QueryInfo<'_>> = (0..queries.len())
        .map(|qi| {
            let eff = SearchSpace::for_database_search(queries.query_len(qi), db_len, num_seqs, &gapped).effective_space;
            QueryInfo::new(queries.origin(qi), SequenceData::borrowed(queries.with_sentinel(qi)), eff)
        })
        .collect();

    let compo_adjust_mode = if args.comp_based_stats == 0 {
        CompoAdjustMode::NoAdjustment
    } else {
        CompoAdjustMode::CompositionBasedStats
    };
    let x_drop_final = (X_DROP_GAPPED_FINAL_BITS * std::f64::consts::LN_2 / gapped.lambda) as i32;
    let cutoff_s = min_cutoff_score(&query_infos, &gapped, args.evalue);
    let redo_params = protein_redo_params(
        MatrixInfo::blosum62(COMPO_SCALING_FACTOR),
        args.gap_open,
        args.gap_extend,
        x_drop_final,
        &gapped,
        cutoff_s,
        args.evalue,
        compo_adjust_mode,
    );

    let ctx = SearchContext {
        table: &table,
        queries: &queries,
        query_infos: &query_infos,
        matrix: &matrix,
        seed_params: SeedParams::new(args.word_size, args.window_size, &ungapped, &gapped),
        gap_open: args.gap_open,
        gap_extend: args.gap_extend,
        gapped,
        redo_params,
        smith_waterman: args.smith_waterman,
        scan_diag: diag_enabled.then_some(&scan_diagnostics),
        redo_diag: diag_enabled.then_some(&redo_diagnostics),
    };

    eprintln!("Searching {} Queries vs {} Subjects...", queries.len(), subject_records.len());
    let bar = ProgressBar::new(subject_records.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress bar template")?,
    );

    let mut heaps: Vec<CompoHeap<SubjectHits>> =
        (0..queries.len()).map(|_| CompoHeap::new(args.max_target_seqs, args.evalue)).collect();
    let batch_size = args.batch_size.max(1);
    for batch_start in (0..num_seqs).step_by(batch_size) {
        let batch_end = (batch_start + batch_size).min(num_seqs);
        let snapshot: &[CompoHeap<SubjectHits>] = &heaps;
        let batch: Vec<Vec<(usize, HeapEntry<SubjectHits>)>> = (batch_start..batch_end)
            .into_par_iter()
            .map_init(
                || Worker::new(&ctx),
                |worker, index| {
                    let subject = SubjectInput {
                        index,
                        id: &subject_ids[index],
                        encoded: &encoded_subjects[index],
                    };
                    let found = realign_subject(&ctx, worker, &subject, snapshot);
                    bar.inc(1);
                    found
                },
            )
            .collect::<Result<_>>()?;

        for (query_index, entry) in batch.into_iter().flatten() {
            heaps[query_index].insert(entry);
        }
    }
    bar.finish_with_message("Done");

    let hits: Vec<Hit> = heaps
        .into_iter()
        .flat_map(|heap| heap.into_sorted_vec().into_iter().flat_map(|entry| entry.payload))
        .collect();
    write_output(&hits, args.out.as_ref())?;

    if diag_enabled {
        scan_diagnostics.print_summary();
        redo_diagnostics.print_summary();
    }
    Ok(())
}
