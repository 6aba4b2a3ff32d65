//! Composition-adjusted re-alignment
//!
//! Reference: ncbi-blast/c++/src/algo/blast/composition_adjustment/
//!
//! Takes the preliminary alignments of one subject, adjusts the scoring
//! matrix to the composition of the aligned region and recomputes the
//! alignments, either from their old starting diagonals or from repeated
//! Smith-Waterman passes. Per-query [`CompoHeap`]s track the best subjects
//! seen so far so later subjects can stop early.
//!
//! Nothing here is shared between threads except read-only parameters;
//! each worker owns a [`CompositionWorkspace`] and [`ForbiddenRanges`].

pub mod alignment;
pub mod compo_heap;
pub mod composition;
pub mod protein;
pub mod redo_alignment;
pub mod sequence;
pub mod smith_waterman;

pub use alignment::{Alignment, AlignmentList, GappingParams, MatrixAdjustRule};
pub use compo_heap::{early_termination, early_termination_all, CompoHeap, HeapEntry};
pub use composition::{
    composition_based_stats, score_probabilities, AminoAcidComposition, CompoAdjustMode, CompositionWorkspace, MatrixInfo,
    TRUE_CHAR_POSITIONS,
};
pub use protein::{protein_redo_params, ProteinGapContext, ProteinRedo};
pub use redo_alignment::{redo_one_match, redo_one_match_smith_waterman, RedoAlignCallbacks, RedoAlignParams, KAPPA_WINDOW_BORDER};
pub use sequence::{MatchingSequence, QueryInfo, SequenceData, SequenceRange};
pub use smith_waterman::{smith_waterman_find_start, smith_waterman_score_only, ForbiddenRanges, SmithWatermanEnd};
