use common::{error::AppError, types::ingestion_status::IngestionPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PhaseTransition {
    Start,
    Complete,
    Fail,
}

impl PhaseTransition {
    fn as_str(self) -> &'static str {
        match self {
            PhaseTransition::Start => "start",
            PhaseTransition::Complete => "complete",
            PhaseTransition::Fail => "fail",
        }
    }
}

fn invalid_transition(phase: IngestionPhase, event: PhaseTransition) -> AppError {
    AppError::Validation(format!(
        "Invalid ingestion transition: {} -> {}",
        phase.as_str(),
        event.as_str()
    ))
}

/// Idle and Failed may start a run; only a Running run may finish. Complete is final.
pub(crate) fn compute_next_phase(
    phase: IngestionPhase,
    event: PhaseTransition,
) -> Result<IngestionPhase, AppError> {
    match (phase, event) {
        (IngestionPhase::Idle | IngestionPhase::Failed, PhaseTransition::Start) => {
            Ok(IngestionPhase::Running)
        }
        (IngestionPhase::Running, PhaseTransition::Complete) => Ok(IngestionPhase::Complete),
        (IngestionPhase::Running, PhaseTransition::Fail) => Ok(IngestionPhase::Failed),
        _ => Err(invalid_transition(phase, event)),
    }
}
