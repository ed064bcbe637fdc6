use axum::{extract::State, Json};
use serde::Serialize;

use crate::api_state::ApiState;

#[derive(Serialize, Debug)]
pub struct StatusResponse {
    pub initialized: bool,
    pub initializing: bool,
    pub progress: u8,
    pub service: String,
    pub phase: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn get_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    let status = state.coordinator.status();

    Json(StatusResponse {
        initialized: status.is_initialized(),
        initializing: status.is_initializing(),
        progress: status.progress,
        service: state.config.service_name.clone(),
        phase: status.phase.as_str(),
        error: status.last_error,
    })
}
