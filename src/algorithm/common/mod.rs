//! Modules shared by the scan and realign pipelines

pub mod diagnostics;
pub mod queries;
