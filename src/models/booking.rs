use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::messages::{EtaValue, LocationFix};
use crate::models::role::ServiceType;

/// A plain coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A coordinate with an optional human-readable address, as used for
/// pickup and dropoff points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Place {
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
}

/// A location sample stamped with the time it was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl TrackedLocation {
    pub fn from_fix(fix: &LocationFix, at: DateTime<Utc>) -> Self {
        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            accuracy: fix.accuracy,
            speed: fix.speed,
            heading: fix.heading,
            timestamp: at,
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Booking status vocabulary as persisted by the Booking store.
///
/// Unknown strings round-trip unchanged through `Other` so that status values
/// written by other parts of the platform are never clobbered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(from = "String", into = "String")]
pub enum BookingStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
    Other(String),
}

impl BookingStatus {
    /// Tracking sessions only make sense while the trip is underway.
    pub fn is_tracking_eligible(&self) -> bool {
        matches!(self, BookingStatus::Accepted | BookingStatus::InProgress)
    }

    pub fn as_str(&self) -> &str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::InProgress => "in-progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Other(s) => s,
        }
    }
}

impl From<String> for BookingStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => BookingStatus::Pending,
            "accepted" => BookingStatus::Accepted,
            "in-progress" => BookingStatus::InProgress,
            "completed" => BookingStatus::Completed,
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Other(s),
        }
    }
}

impl From<BookingStatus> for String {
    fn from(s: BookingStatus) -> Self {
        s.as_str().to_string()
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vehicle summary shown to the customer on join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDetails {
    pub make: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub plate_number: Option<String>,
}

/// A booking as read from the Booking collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub status: BookingStatus,
    pub provider_id: String,
    pub customer_id: String,
    pub service_type: ServiceType,
    pub pickup_location: Option<Place>,
    pub drop_location: Option<Place>,
    pub eta: Option<EtaValue>,
    pub eta_updated_at: Option<DateTime<Utc>>,
    pub current_location: Option<TrackedLocation>,
    pub vehicle_details: Option<VehicleDetails>,
    pub fare: Option<f64>,
    pub distance: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Partial write against a booking. Only `Some` fields are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingPatch {
    pub status: Option<BookingStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub eta: Option<EtaValue>,
    pub eta_updated_at: Option<DateTime<Utc>>,
    pub current_location: Option<TrackedLocation>,
}

/// Maps the transport-level status vocabulary onto the persisted booking
/// vocabulary, stamping trip start/end times where the transition implies them.
/// Unrecognized statuses pass through unchanged.
pub fn map_transport_status(raw: &str, at: DateTime<Utc>) -> BookingPatch {
    let mut patch = BookingPatch::default();
    match raw {
        "arrived" => {
            patch.status = Some(BookingStatus::InProgress);
        }
        "started" => {
            patch.status = Some(BookingStatus::InProgress);
            patch.started_at = Some(at);
        }
        "completed" => {
            patch.status = Some(BookingStatus::Completed);
            patch.ended_at = Some(at);
        }
        "cancelled" => {
            patch.status = Some(BookingStatus::Cancelled);
        }
        other => {
            patch.status = Some(BookingStatus::from(other.to_string()));
        }
    }
    patch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_unknown_strings() {
        let status = BookingStatus::from("on-hold".to_string());
        assert_eq!(status, BookingStatus::Other("on-hold".to_string()));
        assert_eq!(String::from(status), "on-hold");
    }

    #[test]
    fn only_accepted_and_in_progress_are_tracking_eligible() {
        assert!(BookingStatus::Accepted.is_tracking_eligible());
        assert!(BookingStatus::InProgress.is_tracking_eligible());
        assert!(!BookingStatus::Completed.is_tracking_eligible());
        assert!(!BookingStatus::Cancelled.is_tracking_eligible());
        assert!(!BookingStatus::Other("on-hold".into()).is_tracking_eligible());
    }

    #[test]
    fn started_maps_to_in_progress_with_start_stamp() {
        let now = Utc::now();
        let patch = map_transport_status("started", now);
        assert_eq!(patch.status, Some(BookingStatus::InProgress));
        assert_eq!(patch.started_at, Some(now));
        assert_eq!(patch.ended_at, None);
    }

    #[test]
    fn completed_maps_to_completed_with_end_stamp() {
        let now = Utc::now();
        let patch = map_transport_status("completed", now);
        assert_eq!(patch.status, Some(BookingStatus::Completed));
        assert_eq!(patch.ended_at, Some(now));
        assert_eq!(patch.started_at, None);
    }

    #[test]
    fn arrived_maps_to_in_progress_without_stamps() {
        let patch = map_transport_status("arrived", Utc::now());
        assert_eq!(patch.status, Some(BookingStatus::InProgress));
        assert_eq!(patch.started_at, None);
        assert_eq!(patch.ended_at, None);
    }

    #[test]
    fn unknown_status_passes_through() {
        let patch = map_transport_status("delayed", Utc::now());
        assert_eq!(patch.status, Some(BookingStatus::Other("delayed".into())));
    }
}
