use serde::Serialize;

pub const PROGRESS_COMPLETE: u8 = 100;

#[derive(Debug, Default, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IngestionPhase {
    #[default]
    Idle,
    Running,
    Complete,
    Failed,
}

impl IngestionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionPhase::Idle => "idle",
            IngestionPhase::Running => "running",
            IngestionPhase::Complete => "complete",
            IngestionPhase::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, IngestionPhase::Complete | IngestionPhase::Failed)
    }
}

/// Snapshot of the single ingestion run owned by the coordinator.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestionStatus {
    pub phase: IngestionPhase,
    pub progress: u8,
    pub last_error: Option<String>,
}

impl IngestionStatus {
    pub fn is_initialized(&self) -> bool {
        self.phase == IngestionPhase::Complete
    }

    pub fn is_initializing(&self) -> bool {
        self.phase == IngestionPhase::Running
    }
}
