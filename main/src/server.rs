use std::{sync::Arc, time::Duration};

use api_router::{api_routes, api_state::ApiState};
use axum::Router;
use common::{
    graph::RemoteGraphBackend,
    utils::{
        api_key::validator_from_config,
        config::{get_config, AppConfig},
    },
};
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;

    let backend = Arc::new(RemoteGraphBackend::from_config(&config)?);
    info!(
        graph_service = %config.graph_service_url,
        dataset = %config.graph_dataset,
        auth_mode = ?config.auth_mode,
        "Graph backend configured"
    );

    let api_state = ApiState::new(&config, backend, validator_from_config(&config));

    tokio::fs::create_dir_all(&config.static_dir).await?;
    let app = build_app(&api_state, &config);

    if config.initialize_on_startup {
        let outcome = api_state.coordinator.request_start();
        info!(status = outcome.as_str(), "Initialization requested at startup");
    }

    info!("Starting {} listening on 0.0.0.0:{}", config.service_name, config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let grace = Duration::from_secs(config.shutdown_grace_secs);
    if !api_state.coordinator.shutdown(grace).await {
        warn!("Ingestion run abandoned at shutdown");
    }

    Ok(())
}

/// API routes first, then the static client for everything else.
fn build_app(api_state: &ApiState, config: &AppConfig) -> Router {
    Router::new()
        .merge(api_routes(api_state))
        .fallback_service(
            ServeDir::new(&config.static_dir).append_index_html_on_directories(true),
        )
        .layer(CorsLayer::permissive())
        .with_state(api_state.clone())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
