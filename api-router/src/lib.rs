use api_state::ApiState;
use axum::{
    extract::FromRef,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use middleware_api_auth::api_auth;
use routes::{
    ask::ask_question, initialize::initialize, liveness::health, service_info::service_info,
    status::get_status,
};

pub mod api_state;
pub mod error;
mod middleware_api_auth;
mod routes;

/// Router for the question-answering API
pub fn api_routes<S>(app_state: &ApiState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    // Public, unauthenticated endpoints
    let public = Router::new()
        .route("/health", get(health))
        .route("/api", get(service_info))
        .route("/api/status", get(get_status));

    // Protected API endpoints (require auth)
    let protected = Router::new()
        .route("/api/initialize", post(initialize))
        .route("/api/ask", post(ask_question))
        .route_layer(from_fn_with_state(app_state.clone(), api_auth));

    public.merge(protected)
}
