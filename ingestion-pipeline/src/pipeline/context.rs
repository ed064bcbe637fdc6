use std::path::Path;

use common::{error::AppError, graph::GraphBackend};
use tracing::error;

use super::reporter::StatusReporter;

pub struct RunContext<'a> {
    pub run_id: &'a str,
    pub backend: &'a dyn GraphBackend,
    pub source_path: &'a Path,
    pub reporter: &'a StatusReporter,
}

impl<'a> RunContext<'a> {
    pub fn new(
        run_id: &'a str,
        backend: &'a dyn GraphBackend,
        source_path: &'a Path,
        reporter: &'a StatusReporter,
    ) -> Self {
        Self {
            run_id,
            backend,
            source_path,
            reporter,
        }
    }

    pub fn abort(&self, err: AppError) -> AppError {
        error!(
            run_id = %self.run_id,
            progress = self.reporter.snapshot().progress,
            error = %err,
            "ingestion run aborted"
        );
        err
    }
}
