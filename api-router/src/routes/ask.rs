use axum::{extract::State, Json};
use retrieval_pipeline::Answer;
use serde::Deserialize;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Deserialize, Debug)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}

pub async fn ask_question(
    State(state): State<ApiState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<Answer>, ApiError> {
    let answer = state.query_handler.answer(&request.question).await?;

    Ok(Json(answer))
}
