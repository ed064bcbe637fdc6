#![allow(clippy::missing_docs_in_private_items)]

pub mod coordinator;
pub mod pipeline;

#[cfg(test)]
mod test_support;

pub use coordinator::{IngestionCoordinator, StartOutcome};
pub use pipeline::{IngestionRun, PROGRESS_BUILDING, PROGRESS_INGESTED};
