use crate::handlers::{
    connection_url, create_session, diagnostics, get_session, health_check, provider_location,
    push_eta, push_location, ready_check,
};
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Create API routes
pub fn create_api_routes(state: Arc<AppState>) -> Router {
    Router::<Arc<AppState>>::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/v1/diagnostics", get(diagnostics))
        .route("/v1/sessions", post(create_session))
        .route("/v1/sessions/:session_id", get(get_session))
        .route("/v1/sessions/:session_id/connection-url", get(connection_url))
        .route("/v1/sessions/:session_id/location", post(push_location))
        .route("/v1/sessions/:session_id/eta", post(push_eta))
        .route(
            "/v1/sessions/:session_id/provider-location",
            get(provider_location),
        )
        .with_state(state)
}
