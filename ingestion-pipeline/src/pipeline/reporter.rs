use std::sync::Arc;

use common::types::ingestion_status::{IngestionPhase, IngestionStatus, PROGRESS_COMPLETE};
use tokio::sync::watch;
use tracing::warn;

use crate::coordinator::lifecycle::{compute_next_phase, PhaseTransition};

/// Write side of the coordinator's status channel, handed to the running task.
///
/// Updates are ignored unless the phase is `Running`, so a finished run can
/// never be dragged back into progress reporting.
#[derive(Clone)]
pub struct StatusReporter {
    status: Arc<watch::Sender<IngestionStatus>>,
}

impl StatusReporter {
    pub(crate) fn new(status: Arc<watch::Sender<IngestionStatus>>) -> Self {
        Self { status }
    }

    /// Raises progress to `progress`, clamped to 100. Lower values are dropped.
    pub fn advance(&self, progress: u8) {
        let target = progress.min(PROGRESS_COMPLETE);
        self.status.send_if_modified(|status| {
            if status.phase != IngestionPhase::Running || target <= status.progress {
                return false;
            }
            status.progress = target;
            true
        });
    }

    pub fn complete(&self) {
        self.status.send_if_modified(|status| {
            match compute_next_phase(status.phase, PhaseTransition::Complete) {
                Ok(next) => {
                    status.phase = next;
                    status.progress = PROGRESS_COMPLETE;
                    status.last_error = None;
                    true
                }
                Err(err) => {
                    warn!(error = %err, "ignoring completion outside a running ingestion");
                    false
                }
            }
        });
    }

    pub fn fail(&self, message: String) {
        self.status.send_if_modified(|status| {
            match compute_next_phase(status.phase, PhaseTransition::Fail) {
                Ok(next) => {
                    status.phase = next;
                    status.last_error = Some(message);
                    true
                }
                Err(err) => {
                    warn!(error = %err, "ignoring failure outside a running ingestion");
                    false
                }
            }
        });
    }

    pub fn snapshot(&self) -> IngestionStatus {
        self.status.borrow().clone()
    }
}
