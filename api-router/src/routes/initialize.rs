use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::api_state::ApiState;

#[derive(Serialize, Debug)]
pub struct InitializeResponse {
    pub status: &'static str,
    pub progress: u8,
}

/// Starts building the knowledge graph in the background; never waits for it.
pub async fn initialize(State(state): State<ApiState>) -> Json<InitializeResponse> {
    let outcome = state.coordinator.request_start();
    info!(status = outcome.as_str(), "initialization requested");

    Json(InitializeResponse {
        status: outcome.as_str(),
        progress: outcome.progress(),
    })
}
