use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// One reported alignment, in 1-based inclusive coordinates
#[derive(Debug, Clone)]
pub struct Hit {
    pub query_id: String,
    pub subject_id: String,
    pub identity: f64,
    pub length: usize,
    pub mismatch: usize,
    pub gapopen: usize,
    pub q_start: usize,
    pub q_end: usize,
    pub s_start: usize,
    pub s_end: usize,
    pub e_value: f64,
    pub bit_score: f64,
    /// Query index in input order
    pub q_idx: u32,
    /// Subject index in input order
    pub s_idx: u32,
    /// Alignment score in the units it was computed in
    pub raw_score: i32,
}

/// Order of HSPs within one subject: score descending, then subject start
/// ascending, subject end descending, query start ascending, query end
/// descending.
///
/// Reference: ncbi-blast/c++/src/algo/blast/core/blast_hits.c ScoreCompareHSPs
pub fn score_compare_hsps(a: &Hit, b: &Hit) -> Ordering {
    b.raw_score
        .cmp(&a.raw_score)
        .then_with(|| a.s_start.cmp(&b.s_start))
        .then_with(|| b.s_end.cmp(&a.s_end))
        .then_with(|| a.q_start.cmp(&b.q_start))
        .then_with(|| b.q_end.cmp(&a.q_end))
}

/// Tabular output (outfmt 6 columns), one line per hit, in the order given
pub fn write_hits<W: Write>(writer: &mut W, hits: &[Hit]) -> Result<()> {
    for hit in hits {
        writeln!(
            writer,
            "{}\t{}\t{:.3}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.1e}\t{:.1}",
            hit.query_id,
            hit.subject_id,
            hit.identity,
            hit.length,
            hit.mismatch,
            hit.gapopen,
            hit.q_start,
            hit.q_end,
            hit.s_start,
            hit.s_end,
            hit.e_value,
            hit.bit_score
        )?;
    }
    Ok(())
}

/// Write `hits` to `out_path`, or to stdout when no path is given
pub fn write_output(hits: &[Hit], out_path: Option<&PathBuf>) -> Result<()> {
    let stdout = io::stdout();
    let mut writer: Box<dyn Write> = if let Some(path) = out_path {
        Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        ))
    } else {
        Box::new(BufWriter::new(stdout.lock()))
    };
    write_hits(&mut writer, hits)?;
    writer.flush()?;
    Ok(())
}
