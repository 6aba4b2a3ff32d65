pub mod karlin;
pub mod karlin_calc;
pub mod search_space;
pub mod tables;

pub use karlin::*;
pub use karlin_calc::*;
pub use search_space::*;
pub use tables::*;
