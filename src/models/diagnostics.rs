use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Aggregate runtime stats for the tracking service.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct DiagnosticsResponse {
    pub n_sessions: u32,
    pub n_connections: u32,
    pub cpu_usage: f32,
    pub memory_alloc: u64,
    pub memory_total: u64,
    pub memory_free: u64,
}
