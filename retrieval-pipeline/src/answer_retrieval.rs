use std::sync::Arc;

use common::{
    error::AppError,
    graph::{GraphBackend, SearchHit, SourceRef},
    types::ingestion_status::{IngestionPhase, IngestionStatus},
};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

pub const NO_RESULTS_ANSWER: &str =
    "I couldn't find any information about that in the knowledge base.";
pub const NO_ANSWER_TEXT: &str = "I don't have enough information to answer that.";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

/// Answers questions against the built graph. Refuses to touch the backend
/// until ingestion has completed.
#[derive(Clone)]
pub struct QueryHandler {
    backend: Arc<dyn GraphBackend>,
    status: watch::Receiver<IngestionStatus>,
}

impl QueryHandler {
    pub fn new(backend: Arc<dyn GraphBackend>, status: watch::Receiver<IngestionStatus>) -> Self {
        Self { backend, status }
    }

    /// Backend failures are folded into the answer text; only an empty
    /// question or an unfinished graph produce an error.
    #[instrument(skip_all)]
    pub async fn answer(&self, question: &str) -> Result<Answer, AppError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Validation("No question provided".to_string()));
        }

        self.ensure_ready()?;

        info!(question_chars = question.chars().count(), "received question");

        match self.backend.query(question).await {
            Ok(hits) => {
                info!(hits = hits.len(), "graph search finished");
                Ok(shape_answer(hits))
            }
            Err(err) => {
                warn!(error = %err, "error searching knowledge graph");
                Ok(Answer {
                    answer: format!(
                        "An error occurred while searching the knowledge graph: {err}"
                    ),
                    sources: Vec::new(),
                })
            }
        }
    }

    fn ensure_ready(&self) -> Result<(), AppError> {
        match self.status.borrow().phase {
            IngestionPhase::Complete => Ok(()),
            IngestionPhase::Running => Err(AppError::NotReady(
                "Knowledge graph is still initializing".to_string(),
            )),
            IngestionPhase::Idle | IngestionPhase::Failed => Err(AppError::NotReady(
                "Knowledge graph not initialized".to_string(),
            )),
        }
    }
}

fn shape_answer(hits: Vec<SearchHit>) -> Answer {
    if hits.is_empty() {
        return Answer {
            answer: NO_RESULTS_ANSWER.to_string(),
            sources: Vec::new(),
        };
    }

    let mut answer = None;
    let mut sources: Vec<SourceRef> = Vec::new();
    for hit in hits {
        if answer.is_none() {
            answer = hit.text.filter(|text| !text.trim().is_empty());
        }
        if let Some(source) = hit.source {
            if !sources.contains(&source) {
                sources.push(source);
            }
        }
    }

    Answer {
        answer: answer.unwrap_or_else(|| NO_ANSWER_TEXT.to_string()),
        sources,
    }
}
