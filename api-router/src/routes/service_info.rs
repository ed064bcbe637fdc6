use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::api_state::ApiState;

pub async fn service_info(State(state): State<ApiState>) -> impl IntoResponse {
    Json(json!({
        "service": state.config.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "status": "GET /api/status",
            "initialize": "POST /api/initialize",
            "ask": "POST /api/ask",
            "health": "GET /health"
        }
    }))
}
