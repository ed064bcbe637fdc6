mod remote;

pub use remote::RemoteGraphBackend;

use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AppError;

/// A document the graph service cites for part of an answer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SourceRef {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One entry of a graph search response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHit {
    pub text: Option<String>,
    pub source: Option<SourceRef>,
}

/// Knowledge-graph service that owns ingestion, graph construction and search.
///
/// Every call may take minutes; callers must not hold locks across them.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Drops previously ingested data and graph metadata.
    async fn reset(&self) -> Result<(), AppError>;

    /// Loads the corpus file at `source` into the backend.
    async fn ingest(&self, source: &Path) -> Result<(), AppError>;

    /// Derives entities and relationships from everything ingested so far.
    async fn build_graph(&self) -> Result<(), AppError>;

    async fn query(&self, question: &str) -> Result<Vec<SearchHit>, AppError>;
}
