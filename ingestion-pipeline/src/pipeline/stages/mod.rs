use std::io::ErrorKind;

use common::error::AppError;
use state_machines::core::GuardError;
use tracing::{info, instrument};

use super::{
    context::RunContext,
    state::{BackendReset, GraphBuilt, IngestionRunMachine, Ingested, Pending, SourceVerified},
    PROGRESS_BUILDING, PROGRESS_INGESTED,
};

#[instrument(level = "trace", skip_all, fields(run_id = %ctx.run_id))]
pub async fn reset_backend(
    machine: IngestionRunMachine<(), Pending>,
    ctx: &RunContext<'_>,
) -> Result<IngestionRunMachine<(), BackendReset>, AppError> {
    info!(run_id = %ctx.run_id, "pruning previous graph data and system metadata");
    ctx.backend.reset().await?;

    machine
        .reset_backend()
        .map_err(|(_, guard)| map_guard_error("reset_backend", &guard))
}

#[instrument(level = "trace", skip_all, fields(run_id = %ctx.run_id))]
pub async fn verify_source(
    machine: IngestionRunMachine<(), BackendReset>,
    ctx: &RunContext<'_>,
) -> Result<IngestionRunMachine<(), SourceVerified>, AppError> {
    let missing = || {
        AppError::NotFound(format!(
            "Source corpus not found: {}",
            ctx.source_path.display()
        ))
    };

    let metadata = match tokio::fs::metadata(ctx.source_path).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == ErrorKind::NotFound => return Err(missing()),
        Err(err) => return Err(AppError::Io(err)),
    };
    if !metadata.is_file() {
        return Err(missing());
    }

    info!(
        run_id = %ctx.run_id,
        source = %ctx.source_path.display(),
        bytes = metadata.len(),
        "source corpus located"
    );

    machine
        .verify_source()
        .map_err(|(_, guard)| map_guard_error("verify_source", &guard))
}

#[instrument(level = "trace", skip_all, fields(run_id = %ctx.run_id))]
pub async fn ingest_corpus(
    machine: IngestionRunMachine<(), SourceVerified>,
    ctx: &RunContext<'_>,
) -> Result<IngestionRunMachine<(), Ingested>, AppError> {
    ctx.backend.ingest(ctx.source_path).await?;
    ctx.reporter.advance(PROGRESS_INGESTED);
    info!(
        run_id = %ctx.run_id,
        progress = PROGRESS_INGESTED,
        "corpus ingested"
    );

    machine
        .ingest()
        .map_err(|(_, guard)| map_guard_error("ingest", &guard))
}

#[instrument(level = "trace", skip_all, fields(run_id = %ctx.run_id))]
pub async fn build_graph(
    machine: IngestionRunMachine<(), Ingested>,
    ctx: &RunContext<'_>,
) -> Result<IngestionRunMachine<(), GraphBuilt>, AppError> {
    ctx.reporter.advance(PROGRESS_BUILDING);
    info!(
        run_id = %ctx.run_id,
        progress = PROGRESS_BUILDING,
        "generating knowledge graph"
    );
    ctx.backend.build_graph().await?;

    machine
        .build_graph()
        .map_err(|(_, guard)| map_guard_error("build_graph", &guard))
}

fn map_guard_error(event: &str, guard: &GuardError) -> AppError {
    AppError::InternalError(format!(
        "invalid ingestion run transition during {event}: {guard:?}"
    ))
}
