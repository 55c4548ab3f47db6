use crate::models::*;
use utoipa::OpenApi;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/api/ready",
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

/// Runtime diagnostics
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    responses(
        (status = 200, description = "Session/connection counts and system stats", body = DiagnosticsResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

/// Create a tracking session
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Tracking session created", body = CreateSessionResponse),
        (status = 404, description = "Booking, provider or customer not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn create_session_doc() {}

/// Poll a tracking session
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{session_id}",
    params(("session_id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Session projection", body = SessionResponse),
        (status = 404, description = "No active session", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn get_session_doc() {}

/// Mint a socket connection URL
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{session_id}/connection-url",
    params(
        ("session_id" = String, Path, description = "Booking id"),
        ("role" = Role, Query, description = "Claimed role"),
        ("userId" = String, Query, description = "Claimed user id")
    ),
    responses(
        (status = 200, description = "Connection URL", body = ConnectionUrlResponse),
        (status = 403, description = "Not a participant", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn connection_url_doc() {}

/// Push a location sample over REST
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{session_id}/location",
    params(("session_id" = String, Path, description = "Booking id")),
    request_body = LocationPushRequest,
    responses(
        (status = 202, description = "Location accepted", body = HealthResponse),
        (status = 403, description = "Not a participant or not a provider", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn push_location_doc() {}

/// Push an ETA over REST
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{session_id}/eta",
    params(("session_id" = String, Path, description = "Booking id")),
    request_body = EtaPushRequest,
    responses(
        (status = 202, description = "ETA accepted", body = HealthResponse),
        (status = 403, description = "Not a participant", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn push_eta_doc() {}

/// Poll the provider's last known location
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{session_id}/provider-location",
    params(
        ("session_id" = String, Path, description = "Booking id"),
        ("role" = Role, Query, description = "Claimed role"),
        ("userId" = String, Query, description = "Claimed user id")
    ),
    responses(
        (status = 200, description = "Last known location, if any", body = ProviderLocationResponse),
        (status = 403, description = "Not a participant", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn provider_location_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ready_check_doc,
        diagnostics_doc,
        create_session_doc,
        get_session_doc,
        connection_url_doc,
        push_location_doc,
        push_eta_doc,
        provider_location_doc,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            DiagnosticsResponse,
            CreateSessionRequest,
            CreateSessionResponse,
            SessionResponse,
            ConnectionUrlResponse,
            LocationPushRequest,
            EtaPushRequest,
            ProviderLocationResponse,
            LocationFix,
            TrackedLocation,
            EtaValue,
            Role,
            ServiceType,
        )
    ),
    tags(
        (name = "tracking", description = "Trip tracking endpoints")
    )
)]
pub struct ApiDoc;
