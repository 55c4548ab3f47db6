use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::error;

use crate::models::{
    error_response, AuthQuery, ClientMessage, ErrorResponse, EtaData, EtaPushRequest,
    HealthResponse, LocationPushRequest, ProviderLocationResponse,
};
use crate::AppState;

/// REST fallback for providers pushing a location sample without a socket.
/// Routed exactly like a `location_update` frame.
pub async fn push_location(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(req): Json<LocationPushRequest>,
) -> Result<(StatusCode, Json<HealthResponse>), (StatusCode, Json<ErrorResponse>)> {
    if !state
        .service
        .validate(&session_id, req.role, &req.user_id)
        .await
    {
        return Err(error_response(
            StatusCode::FORBIDDEN,
            "Not authorized for this tracking session",
        ));
    }
    if !req.role.is_provider() {
        return Err(error_response(
            StatusCode::FORBIDDEN,
            "Only provider roles may push location",
        ));
    }

    state
        .service
        .handle_message(
            &session_id,
            req.role,
            &req.user_id,
            ClientMessage::LocationUpdate(req.location),
        )
        .await;
    Ok((
        StatusCode::ACCEPTED,
        Json(HealthResponse {
            status: "ok".to_string(),
            message: "Location accepted".to_string(),
        }),
    ))
}

/// REST fallback for `eta_update`.
pub async fn push_eta(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(req): Json<EtaPushRequest>,
) -> Result<(StatusCode, Json<HealthResponse>), (StatusCode, Json<ErrorResponse>)> {
    if !state
        .service
        .validate(&session_id, req.role, &req.user_id)
        .await
    {
        return Err(error_response(
            StatusCode::FORBIDDEN,
            "Not authorized for this tracking session",
        ));
    }

    state
        .service
        .handle_message(
            &session_id,
            req.role,
            &req.user_id,
            ClientMessage::EtaUpdate(EtaData { eta: req.eta }),
        )
        .await;
    Ok((
        StatusCode::ACCEPTED,
        Json(HealthResponse {
            status: "ok".to_string(),
            message: "ETA accepted".to_string(),
        }),
    ))
}

/// Last known provider location for a validated participant, read from the
/// in-memory session first and the Booking collaborator as fallback.
pub async fn provider_location(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Query(auth): Query<AuthQuery>,
) -> Result<(StatusCode, Json<ProviderLocationResponse>), (StatusCode, Json<ErrorResponse>)> {
    if !state
        .service
        .validate(&session_id, auth.role, &auth.user_id)
        .await
    {
        return Err(error_response(
            StatusCode::FORBIDDEN,
            "Not authorized for this tracking session",
        ));
    }

    let location = match state.service.session(&session_id).await {
        Some(session) if session.last_location.is_some() => session.last_location,
        _ => match state.service.booking_location(&session_id).await {
            Ok(location) => location,
            Err(e) => {
                error!("Failed to read booking location for {}: {}", session_id, e);
                return Err(error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to read provider location",
                ));
            }
        },
    };
    Ok((StatusCode::OK, Json(ProviderLocationResponse { location })))
}
