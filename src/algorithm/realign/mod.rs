//! Protein search with composition-adjusted realignment
//!
//! Protein queries are indexed in a neighborhood-word lookup table and every
//! subject is scanned for word hits. Hits that pass the two-hit test are
//! extended without gaps, promising HSPs get a preliminary gapped alignment,
//! and the subject's alignments are then recomputed with a matrix adjusted
//! to the composition of each aligned region.

pub mod args;
pub mod constants;
pub mod extension;
pub mod utils;

pub use args::RealignArgs;
pub use utils::run;
