pub mod load_index;
pub mod search;
pub mod stats;

pub use load_index::*;
pub use search::*;
pub use stats::*;
