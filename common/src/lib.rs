pub mod error;
pub mod graph;
pub mod types;
pub mod utils;
