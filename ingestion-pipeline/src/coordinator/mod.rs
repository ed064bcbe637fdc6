pub(crate) mod lifecycle;

use std::{path::PathBuf, sync::Arc, time::Duration};

use common::{
    error::AppError,
    graph::GraphBackend,
    types::ingestion_status::{IngestionPhase, IngestionStatus, PROGRESS_COMPLETE},
};
use tokio::sync::watch;
use tokio_util::task::TaskTracker;
use tracing::{error, info};
use uuid::Uuid;

use self::lifecycle::{compute_next_phase, PhaseTransition};
use crate::pipeline::{IngestionRun, StatusReporter};

/// Answer to a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    AlreadyInitialized,
    InProgress { progress: u8 },
    Started,
}

impl StartOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StartOutcome::AlreadyInitialized => "already_initialized",
            StartOutcome::InProgress { .. } => "initialization_in_progress",
            StartOutcome::Started => "initialization_started",
        }
    }

    pub fn progress(&self) -> u8 {
        match self {
            StartOutcome::AlreadyInitialized => PROGRESS_COMPLETE,
            StartOutcome::InProgress { progress } => *progress,
            StartOutcome::Started => 0,
        }
    }
}

/// Owns the ingestion lifecycle: at most one run at a time, status readable
/// by anyone without waiting on the backend.
pub struct IngestionCoordinator {
    status: Arc<watch::Sender<IngestionStatus>>,
    backend: Arc<dyn GraphBackend>,
    source_path: PathBuf,
    tracker: TaskTracker,
}

impl IngestionCoordinator {
    pub fn new(backend: Arc<dyn GraphBackend>, source_path: PathBuf) -> Self {
        let (status, _) = watch::channel(IngestionStatus::default());

        Self {
            status: Arc::new(status),
            backend,
            source_path,
            tracker: TaskTracker::new(),
        }
    }

    /// Starts a run unless one is active or the graph is already built.
    ///
    /// The phase check and the switch to `Running` happen under the status
    /// channel's lock, so concurrent callers cannot both start a run. Must be
    /// called from within a Tokio runtime.
    pub fn request_start(&self) -> StartOutcome {
        let mut outcome = StartOutcome::Started;

        let started = self.status.send_if_modified(|status| match status.phase {
            IngestionPhase::Complete => {
                outcome = StartOutcome::AlreadyInitialized;
                false
            }
            IngestionPhase::Running => {
                outcome = StartOutcome::InProgress {
                    progress: status.progress,
                };
                false
            }
            IngestionPhase::Idle | IngestionPhase::Failed => {
                debug_assert!(compute_next_phase(status.phase, PhaseTransition::Start).is_ok());
                status.phase = IngestionPhase::Running;
                status.progress = 0;
                status.last_error = None;
                true
            }
        });

        if started {
            self.spawn_run();
        }

        outcome
    }

    fn spawn_run(&self) {
        let reporter = StatusReporter::new(Arc::clone(&self.status));
        let run = IngestionRun::new(
            format!("ingestion-run-{}", Uuid::new_v4()),
            Arc::clone(&self.backend),
            self.source_path.clone(),
            reporter.clone(),
        );
        let run_id = run.run_id().to_string();

        info!(
            %run_id,
            source = %self.source_path.display(),
            "ingestion run started"
        );

        self.tracker.spawn(async move {
            // A panic inside a backend call surfaces here as a JoinError.
            if let Err(join_err) = tokio::spawn(run.execute()).await {
                let err = AppError::from(join_err);
                error!(%run_id, error = %err, "ingestion run crashed");
                reporter.fail(format!("Unexpected error during ingestion: {err}"));
            }
        });
    }

    pub fn status(&self) -> IngestionStatus {
        self.status.borrow().clone()
    }

    /// Receiver that observes every status change; used by the query side to
    /// gate on readiness.
    pub fn subscribe(&self) -> watch::Receiver<IngestionStatus> {
        self.status.subscribe()
    }

    /// Stops accepting tracked work and waits up to `grace` for an active run.
    /// Returns `true` when nothing was left running.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.tracker.close();
        let drained = tokio::time::timeout(grace, self.tracker.wait())
            .await
            .is_ok();
        if !drained {
            info!(
                phase = self.status().phase.as_str(),
                "shutting down with an ingestion run still active"
            );
        }
        drained
    }
}
