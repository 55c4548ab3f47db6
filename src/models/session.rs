use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::booking::TrackedLocation;
use crate::models::messages::{EtaValue, LocationFix};
use crate::models::role::{Role, ServiceType};

/// Request to open a tracking session when a booking is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub booking_id: String,
    pub provider_id: String,
    pub customer_id: String,
    pub service_type: ServiceType,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub success: bool,
}

/// Read-only projection of a session for non-socket status polling.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: String,
    pub last_update: Option<DateTime<Utc>>,
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConnectionUrlResponse {
    pub url: String,
}

/// Identity claim carried by the REST entry points that stand in for a socket.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthQuery {
    pub role: Role,
    pub user_id: String,
}

/// REST fallback body for providers pushing location without a socket.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationPushRequest {
    pub role: Role,
    pub user_id: String,
    #[serde(flatten)]
    pub location: LocationFix,
}

/// REST fallback body for `eta_update`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EtaPushRequest {
    pub role: Role,
    pub user_id: String,
    pub eta: EtaValue,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProviderLocationResponse {
    pub location: Option<TrackedLocation>,
}
