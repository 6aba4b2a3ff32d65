//! Constants for the protein search with composition-adjusted realignment
//!
//! Dropoffs and triggers are in bits; they are converted to raw scores with
//! the ungapped or gapped Karlin-Altschul parameters at run time.

/// BLAST_UNGAPPED_X_DROPOFF_PROT
pub const X_DROP_UNGAPPED_BITS: f64 = 7.0;

/// BLAST_GAP_X_DROPOFF_PROT for preliminary extension
pub const X_DROP_GAPPED_PRELIM_BITS: f64 = 15.0;

/// BLAST_GAP_X_DROPOFF_FINAL_PROT for the redo pass
pub const X_DROP_GAPPED_FINAL_BITS: f64 = 25.0;

/// BLAST_GAP_TRIGGER_PROT: ungapped score needed to attempt a gapped extension
pub const GAP_TRIGGER_BITS: f64 = 22.0;

/// BLAST_WINDOW_SIZE_PROT
/// Window size for two-hit requirement in protein searches
pub const TWO_HIT_WINDOW: usize = 40;

/// BLAST_GAP_OPEN_PROT
pub const GAP_OPEN: i32 = 11;

/// BLAST_GAP_EXTN_PROT
pub const GAP_EXTEND: i32 = 1;

/// Factor the matrix is scaled by before composition adjustment
pub const COMPO_SCALING_FACTOR: f64 = 32.0;

/// HSP_MAX_WINDOW: residues used to pick the start of a gapped extension
pub const GAPPED_START_WINDOW: usize = 11;
