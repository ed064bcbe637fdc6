use std::sync::Arc;

use common::{graph::GraphBackend, utils::api_key::KeyValidator, utils::config::AppConfig};
use ingestion_pipeline::IngestionCoordinator;
use retrieval_pipeline::QueryHandler;

#[derive(Clone)]
pub struct ApiState {
    pub coordinator: Arc<IngestionCoordinator>,
    pub query_handler: QueryHandler,
    pub key_validator: Arc<dyn KeyValidator>,
    pub config: AppConfig,
}

impl ApiState {
    /// Builds the coordinator for `config.corpus_path` and a query handler
    /// that follows its status.
    pub fn new(
        config: &AppConfig,
        backend: Arc<dyn GraphBackend>,
        key_validator: Arc<dyn KeyValidator>,
    ) -> Self {
        let coordinator = Arc::new(IngestionCoordinator::new(
            Arc::clone(&backend),
            config.corpus_path.clone(),
        ));
        let query_handler = QueryHandler::new(backend, coordinator.subscribe());

        Self {
            coordinator,
            query_handler,
            key_validator,
            config: config.clone(),
        }
    }
}
