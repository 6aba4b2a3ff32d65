pub mod common;
pub mod realign;
pub mod wordscan;
