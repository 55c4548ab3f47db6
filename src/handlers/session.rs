use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::error;

use crate::models::{
    error_response, AuthQuery, ConnectionUrlResponse, CreateSessionRequest, CreateSessionResponse,
    ErrorResponse, SessionResponse,
};
use crate::tracking::lifecycle::CreateSessionError;
use crate::AppState;

/// Open a tracking session for a booking that was just accepted.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), (StatusCode, Json<ErrorResponse>)> {
    match state
        .service
        .create_session(&req.booking_id, &req.provider_id, &req.customer_id, req.service_type)
        .await
    {
        Ok(session_id) => Ok((
            StatusCode::CREATED,
            Json(CreateSessionResponse {
                session_id,
                success: true,
            }),
        )),
        Err(e @ CreateSessionError::BookingNotFound(_))
        | Err(e @ CreateSessionError::ProviderNotFound(_))
        | Err(e @ CreateSessionError::CustomerNotFound(_)) => {
            Err(error_response(StatusCode::NOT_FOUND, e.to_string()))
        }
        Err(CreateSessionError::Store(e)) => {
            error!("Failed to create session for booking {}: {}", req.booking_id, e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create tracking session",
            ))
        }
    }
}

/// Read-only session projection for non-socket status polling.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<(StatusCode, Json<SessionResponse>), (StatusCode, Json<ErrorResponse>)> {
    match state.service.session(&session_id).await {
        Some(session) => {
            let mut participants: Vec<String> = session.participants.into_iter().collect();
            participants.sort();
            Ok((
                StatusCode::OK,
                Json(SessionResponse {
                    id: session.id,
                    last_update: session.last_update,
                    participants,
                }),
            ))
        }
        None => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("No active tracking session for booking '{}'", session_id),
        )),
    }
}

/// Mint the socket URL for a validated participant. Runs the same validator
/// as the socket handshake; the claim is re-checked again when the socket
/// actually connects.
pub async fn connection_url(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Query(auth): Query<AuthQuery>,
) -> Result<(StatusCode, Json<ConnectionUrlResponse>), (StatusCode, Json<ErrorResponse>)> {
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

    let url = format!(
        "{}/ws/track?session={}&role={}&userId={}",
        state.ws_public_url, session_id, auth.role, auth.user_id
    );
    Ok((StatusCode::OK, Json(ConnectionUrlResponse { url })))
}
