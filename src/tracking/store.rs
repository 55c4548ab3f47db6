//! In-memory registry of active tracking sessions, keyed by booking id.
//!
//! Sessions live for at most the lifetime of the process; after a restart they
//! are rebuilt lazily from the Booking collaborator's persisted state.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use crate::models::{LocationFix, Role, TrackedLocation};

/// The `"{role}_{userId}"` key identifying one participant within a session.
pub fn participant_key(role: Role, user_id: &str) -> String {
    format!("{}_{}", role, user_id)
}

/// Live tracking context for one booking.
#[derive(Debug, Clone)]
pub struct TrackingSession {
    pub id: String,
    pub last_location: Option<TrackedLocation>,
    pub last_update: Option<DateTime<Utc>>,
    pub participants: HashSet<String>,
}

impl TrackingSession {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            last_location: None,
            last_update: None,
            participants: HashSet::new(),
        }
    }
}

/// Session registry. Owned by the tracking service rather than held in a
/// process-wide global, so each test case can build an isolated instance.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, TrackingSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a participant is authorized for a session, creating the
    /// session entry if this is the first participant.
    pub async fn register_participant(&self, session_id: &str, role: Role, user_id: &str) {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| TrackingSession::new(session_id));
        session.participants.insert(participant_key(role, user_id));
    }

    /// Store a location sample, returning the stamped location that was kept.
    /// Returns `None` when no session exists for the booking.
    pub async fn record_location(
        &self,
        session_id: &str,
        fix: &LocationFix,
        at: DateTime<Utc>,
    ) -> Option<TrackedLocation> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(session_id)?;
        let location = TrackedLocation::from_fix(fix, at);
        session.last_location = Some(location.clone());
        session.last_update = Some(at);
        Some(location)
    }

    pub async fn get(&self, session_id: &str) -> Option<TrackingSession> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Delete a session, returning its final state for the teardown flush.
    pub async fn remove(&self, session_id: &str) -> Option<TrackingSession> {
        self.sessions.write().await.remove(session_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_keys_use_role_prefix() {
        assert_eq!(participant_key(Role::Driver, "P1"), "driver_P1");
        assert_eq!(participant_key(Role::Customer, "C1"), "customer_C1");
    }

    #[tokio::test]
    async fn first_participant_creates_the_session() {
        let store = SessionStore::new();
        assert!(store.get("B1").await.is_none());

        store.register_participant("B1", Role::Driver, "P1").await;
        store.register_participant("B1", Role::Customer, "C1").await;

        let session = store.get("B1").await.unwrap();
        assert_eq!(session.id, "B1");
        assert!(session.last_location.is_none());
        assert_eq!(session.participants.len(), 2);
        assert!(session.participants.contains("driver_P1"));
    }

    #[tokio::test]
    async fn location_writes_stamp_last_update() {
        let store = SessionStore::new();
        store.register_participant("B1", Role::Driver, "P1").await;

        let now = Utc::now();
        let fix = LocationFix {
            latitude: 12.9,
            longitude: 77.6,
            accuracy: Some(5.0),
            speed: None,
            heading: None,
        };
        let kept = store.record_location("B1", &fix, now).await.unwrap();
        assert_eq!(kept.latitude, 12.9);
        assert_eq!(kept.timestamp, now);

        let session = store.get("B1").await.unwrap();
        assert_eq!(session.last_update, Some(now));
        assert_eq!(session.last_location.unwrap().longitude, 77.6);
    }

    #[tokio::test]
    async fn recording_against_unknown_session_is_a_noop() {
        let store = SessionStore::new();
        let fix = LocationFix {
            latitude: 0.0,
            longitude: 0.0,
            accuracy: None,
            speed: None,
            heading: None,
        };
        assert!(store.record_location("B1", &fix, Utc::now()).await.is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn remove_returns_final_state() {
        let store = SessionStore::new();
        store.register_participant("B1", Role::Driver, "P1").await;
        let removed = store.remove("B1").await.unwrap();
        assert_eq!(removed.id, "B1");
        assert!(store.get("B1").await.is_none());
    }
}
