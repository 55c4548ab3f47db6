use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::booking::{BookingStatus, Place, TrackedLocation, VehicleDetails};
use crate::models::role::Role;

/// An inbound location sample. Latitude and longitude are mandatory; frames
/// missing either fail to parse and are dropped by the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
}

/// An ETA as supplied by the provider app — either free text ("5 min") or a
/// number of minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum EtaValue {
    Text(String),
    Minutes(f64),
}

impl EtaValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, EtaValue::Text(s) if s.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EtaData {
    pub eta: EtaValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusData {
    pub status: String,
}

/// Messages a connected client may send over the tracking socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    LocationUpdate(LocationFix),
    EtaUpdate(EtaData),
    StatusUpdate(StatusData),
}

/// Contact and vehicle summary for the assigned provider, sent to a joining
/// customer as part of `route_data`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub profile_image: Option<String>,
}

/// One-shot route overview sent to a customer when it joins a session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteData {
    pub booking_id: String,
    pub status: BookingStatus,
    pub pickup_location: Option<Place>,
    pub drop_location: Option<Place>,
    pub provider: Option<ProviderSummary>,
    pub vehicle_details: Option<VehicleDetails>,
    pub fare: Option<f64>,
    pub distance: Option<f64>,
}

/// Messages the service emits to connected clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    LocationUpdate(TrackedLocation),
    #[serde(rename_all = "camelCase")]
    EtaUpdate {
        eta: EtaValue,
        eta_updated_at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    StatusUpdate {
        status: String,
        role: Role,
        user_id: String,
    },
    RouteData(RouteData),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_update_parses_with_optional_fields_absent() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"location_update","data":{"latitude":12.9,"longitude":77.6}}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::LocationUpdate(fix) => {
                assert_eq!(fix.latitude, 12.9);
                assert_eq!(fix.longitude, 77.6);
                assert_eq!(fix.accuracy, None);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn location_update_without_coordinates_is_rejected() {
        let res = serde_json::from_str::<ClientMessage>(
            r#"{"type":"location_update","data":{"latitude":12.9}}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn eta_accepts_text_and_number() {
        let text: ClientMessage =
            serde_json::from_str(r#"{"type":"eta_update","data":{"eta":"5 min"}}"#).unwrap();
        assert_eq!(
            text,
            ClientMessage::EtaUpdate(EtaData {
                eta: EtaValue::Text("5 min".into())
            })
        );

        let minutes: ClientMessage =
            serde_json::from_str(r#"{"type":"eta_update","data":{"eta":5}}"#).unwrap();
        assert_eq!(
            minutes,
            ClientMessage::EtaUpdate(EtaData {
                eta: EtaValue::Minutes(5.0)
            })
        );
    }

    #[test]
    fn unknown_message_type_is_rejected() {
        let res = serde_json::from_str::<ClientMessage>(r#"{"type":"chat","data":{"text":"hi"}}"#);
        assert!(res.is_err());
    }

    #[test]
    fn status_update_serializes_with_sender_identity() {
        let msg = ServerMessage::StatusUpdate {
            status: "arrived".into(),
            role: Role::Driver,
            user_id: "P1".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "status_update");
        assert_eq!(json["data"]["status"], "arrived");
        assert_eq!(json["data"]["role"], "driver");
        assert_eq!(json["data"]["userId"], "P1");
    }
}
