use std::{
    io::Write,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use common::{
    error::AppError,
    graph::{GraphBackend, SearchHit},
    types::ingestion_status::IngestionStatus,
};
use tempfile::NamedTempFile;
use tokio::sync::{watch, Mutex, Notify};

#[derive(Default)]
pub struct MockBackend {
    pub calls: Mutex<Vec<&'static str>>,
    pub fail_ingest: AtomicBool,
    pub fail_reset: bool,
    pub panic_on_build: bool,
    pub ingest_gate: Option<Arc<Notify>>,
}

impl MockBackend {
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            ingest_gate: Some(gate),
            ..Self::default()
        }
    }

    async fn record(&self, stage: &'static str) {
        self.calls.lock().await.push(stage);
    }

    pub async fn recorded(&self) -> Vec<&'static str> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl GraphBackend for MockBackend {
    async fn reset(&self) -> Result<(), AppError> {
        self.record("reset").await;
        if self.fail_reset {
            return Err(AppError::Graph("prune failed with 503".into()));
        }
        Ok(())
    }

    async fn ingest(&self, _source: &Path) -> Result<(), AppError> {
        self.record("ingest").await;
        if let Some(gate) = &self.ingest_gate {
            gate.notified().await;
        }
        if self.fail_ingest.load(Ordering::SeqCst) {
            return Err(AppError::Graph("add failed with 500: disk full".into()));
        }
        Ok(())
    }

    async fn build_graph(&self) -> Result<(), AppError> {
        self.record("build_graph").await;
        assert!(!self.panic_on_build, "cognify exploded");
        Ok(())
    }

    async fn query(&self, _question: &str) -> Result<Vec<SearchHit>, AppError> {
        self.record("query").await;
        Ok(Vec::new())
    }
}

pub fn corpus_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create corpus file");
    writeln!(file, "Mr and Mrs Dursley, of number four, Privet Drive.").expect("write corpus");
    file
}

pub async fn wait_for_terminal(receiver: &mut watch::Receiver<IngestionStatus>) -> IngestionStatus {
    tokio::time::timeout(
        Duration::from_secs(5),
        receiver.wait_for(|status| status.phase.is_terminal()),
    )
    .await
    .expect("ingestion should reach a terminal phase")
    .expect("status channel open")
    .clone()
}
