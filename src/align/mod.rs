pub mod result;
pub mod traceback;
pub mod ungapped;

pub use result::{AlignmentStats, EditOp, EditScript};
pub use traceback::{extend_with_traceback, gapped_align_with_traceback, Extension, GapScoring, GappedAlignment};
pub use ungapped::{best_start_for_gapped_alignment, extend_one_hit, UngappedHsp};
