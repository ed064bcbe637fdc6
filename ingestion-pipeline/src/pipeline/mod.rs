mod context;
mod reporter;
mod stages;
mod state;

pub use reporter::StatusReporter;

use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use common::{error::AppError, graph::GraphBackend};
use tracing::{error, info};

use self::{
    context::RunContext,
    stages::{build_graph, ingest_corpus, reset_backend, verify_source},
    state::pending,
};

/// Progress reported once the corpus has been handed to the backend.
pub const PROGRESS_INGESTED: u8 = 80;
/// Progress reported while the backend builds the graph.
pub const PROGRESS_BUILDING: u8 = 90;

/// One pass of reset, source check, ingest and graph build.
pub struct IngestionRun {
    run_id: String,
    backend: Arc<dyn GraphBackend>,
    source_path: PathBuf,
    reporter: StatusReporter,
}

impl IngestionRun {
    pub fn new(
        run_id: String,
        backend: Arc<dyn GraphBackend>,
        source_path: PathBuf,
        reporter: StatusReporter,
    ) -> Self {
        Self {
            run_id,
            backend,
            source_path,
            reporter,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Drives the run to a terminal phase. Every return path records either
    /// completion or the failure message.
    #[tracing::instrument(
        skip_all,
        fields(run_id = %self.run_id, source = %self.source_path.display())
    )]
    pub async fn execute(self) {
        let started = Instant::now();

        match self.drive().await {
            Ok(()) => {
                self.reporter.complete();
                info!(
                    run_id = %self.run_id,
                    total_ms = duration_millis(started.elapsed()),
                    "ingestion run complete"
                );
            }
            Err(err) => {
                error!(
                    run_id = %self.run_id,
                    total_ms = duration_millis(started.elapsed()),
                    error = %err,
                    "ingestion run failed"
                );
                self.reporter.fail(err.to_string());
            }
        }
    }

    async fn drive(&self) -> Result<(), AppError> {
        let ctx = RunContext::new(
            &self.run_id,
            self.backend.as_ref(),
            &self.source_path,
            &self.reporter,
        );

        let machine = pending();
        let machine = reset_backend(machine, &ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let machine = verify_source(machine, &ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let machine = ingest_corpus(machine, &ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let _machine = build_graph(machine, &ctx)
            .await
            .map_err(|err| ctx.abort(err))?;

        Ok(())
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
