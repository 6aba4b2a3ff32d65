//! Word scan: build the lookup table and list every (query, subject) word hit

pub mod args;
pub mod utils;

pub use args::ScanArgs;
pub use utils::run;
