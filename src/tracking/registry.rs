//! Map of live connections per session, with best-effort broadcast.

use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use super::store::participant_key;
use crate::models::{Role, ServerMessage};

/// Outbound half of one connection. The socket task drains the paired
/// receiver and writes each payload as a text frame.
pub type ConnectionSender = mpsc::UnboundedSender<String>;

/// Serialize a server message and hand it to a single connection.
/// A closed receiver is ignored; delivery is fire-and-forget.
pub fn send_to(tx: &ConnectionSender, message: &ServerMessage) {
    match serde_json::to_string(message) {
        Ok(payload) => {
            let _ = tx.send(payload);
        }
        Err(e) => error!("Failed to serialize outbound message: {}", e),
    }
}

/// Connection registry. One entry per participant key per session; a
/// reconnect under the same key replaces the previous handle.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<String, HashMap<String, ConnectionSender>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) the handle for a participant.
    pub async fn add(&self, session_id: &str, role: Role, user_id: &str, tx: ConnectionSender) {
        let key = participant_key(role, user_id);
        let mut connections = self.connections.write().await;
        let session = connections.entry(session_id.to_string()).or_default();
        if session.insert(key.clone(), tx).is_some() {
            info!("Replaced existing connection {} in session {}", key, session_id);
        }
    }

    /// Drop a participant's handle, but only when `tx` is the handle that is
    /// actually stored. A socket that was superseded by a reconnect under the
    /// same key cleans up after itself too, and must not evict the fresh
    /// connection. Returns `true` when the session has no remaining
    /// connections, which is the caller's cue to tear it down.
    pub async fn remove(
        &self,
        session_id: &str,
        role: Role,
        user_id: &str,
        tx: &ConnectionSender,
    ) -> bool {
        let key = participant_key(role, user_id);
        let mut connections = self.connections.write().await;
        let Some(session) = connections.get_mut(session_id) else {
            return false;
        };
        match session.get(&key) {
            Some(stored) if stored.same_channel(tx) => {
                session.remove(&key);
            }
            _ => {
                debug!(
                    "Ignoring removal of superseded connection {} in session {}",
                    key, session_id
                );
                return false;
            }
        }
        if session.is_empty() {
            connections.remove(session_id);
            return true;
        }
        false
    }

    /// Send a message to every open connection in a session, the sender's own
    /// included. Serializes once; closed handles are skipped silently.
    pub async fn broadcast(&self, session_id: &str, message: &ServerMessage) {
        let payload = match serde_json::to_string(message) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to serialize broadcast for session {}: {}", session_id, e);
                return;
            }
        };

        let connections = self.connections.read().await;
        let Some(session) = connections.get(session_id) else {
            debug!("Broadcast for session {} with no open connections", session_id);
            return;
        };
        for (key, tx) in session.iter() {
            if tx.send(payload.clone()).is_err() {
                debug!("Skipping closed connection {} in session {}", key, session_id);
            }
        }
    }

    /// Total open connections across all sessions.
    pub async fn connection_count(&self) -> usize {
        self.connections
            .read()
            .await
            .values()
            .map(|session| session.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::models::TrackedLocation;

    fn location_message() -> ServerMessage {
        ServerMessage::LocationUpdate(TrackedLocation {
            latitude: 12.9,
            longitude: 77.6,
            accuracy: None,
            speed: None,
            heading: None,
            timestamp: Utc::now(),
        })
    }

    #[tokio::test]
    async fn broadcast_reaches_every_open_connection() {
        let registry = ConnectionRegistry::new();
        let (driver_tx, mut driver_rx) = mpsc::unbounded_channel();
        let (customer_tx, mut customer_rx) = mpsc::unbounded_channel();
        registry.add("B1", Role::Driver, "P1", driver_tx).await;
        registry.add("B1", Role::Customer, "C1", customer_tx).await;

        registry.broadcast("B1", &location_message()).await;

        let driver_payload = driver_rx.try_recv().unwrap();
        let customer_payload = customer_rx.try_recv().unwrap();
        assert_eq!(driver_payload, customer_payload);
        assert!(driver_payload.contains("location_update"));
    }

    #[tokio::test]
    async fn broadcast_skips_closed_connections() {
        let registry = ConnectionRegistry::new();
        let (driver_tx, mut driver_rx) = mpsc::unbounded_channel();
        let (customer_tx, customer_rx) = mpsc::unbounded_channel();
        registry.add("B1", Role::Driver, "P1", driver_tx).await;
        registry.add("B1", Role::Customer, "C1", customer_tx).await;
        drop(customer_rx);

        registry.broadcast("B1", &location_message()).await;
        assert!(driver_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn broadcast_does_not_cross_sessions() {
        let registry = ConnectionRegistry::new();
        let (b1_tx, mut b1_rx) = mpsc::unbounded_channel();
        let (b2_tx, mut b2_rx) = mpsc::unbounded_channel();
        registry.add("B1", Role::Driver, "P1", b1_tx).await;
        registry.add("B2", Role::Driver, "P2", b2_tx).await;

        registry.broadcast("B1", &location_message()).await;
        assert!(b1_rx.try_recv().is_ok());
        assert!(b2_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn reconnect_replaces_the_previous_handle() {
        let registry = ConnectionRegistry::new();
        let (old_tx, mut old_rx) = mpsc::unbounded_channel();
        let (new_tx, mut new_rx) = mpsc::unbounded_channel();
        registry.add("B1", Role::Driver, "P1", old_tx).await;
        registry.add("B1", Role::Driver, "P1", new_tx).await;
        assert_eq!(registry.connection_count().await, 1);

        registry.broadcast("B1", &location_message()).await;
        assert!(new_rx.try_recv().is_ok());
        // Old handle is dropped on replacement, not merged.
        assert!(matches!(
            old_rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn last_removal_signals_teardown() {
        let registry = ConnectionRegistry::new();
        let (driver_tx, _driver_rx) = mpsc::unbounded_channel();
        let (customer_tx, _customer_rx) = mpsc::unbounded_channel();
        registry.add("B1", Role::Driver, "P1", driver_tx.clone()).await;
        registry
            .add("B1", Role::Customer, "C1", customer_tx.clone())
            .await;

        assert!(!registry.remove("B1", Role::Driver, "P1", &driver_tx).await);
        assert!(registry.remove("B1", Role::Customer, "C1", &customer_tx).await);
        assert_eq!(registry.connection_count().await, 0);
        // Removing from a session that is already gone is not a teardown cue.
        assert!(!registry.remove("B1", Role::Customer, "C1", &customer_tx).await);
    }

    #[tokio::test]
    async fn removal_ignores_a_superseded_handle() {
        let registry = ConnectionRegistry::new();
        let (old_tx, _old_rx) = mpsc::unbounded_channel();
        let (new_tx, mut new_rx) = mpsc::unbounded_channel();
        registry.add("B1", Role::Driver, "P1", old_tx.clone()).await;
        registry.add("B1", Role::Driver, "P1", new_tx.clone()).await;

        // The replaced socket's cleanup must leave the fresh handle in place.
        assert!(!registry.remove("B1", Role::Driver, "P1", &old_tx).await);
        assert_eq!(registry.connection_count().await, 1);
        registry.broadcast("B1", &location_message()).await;
        assert!(new_rx.try_recv().is_ok());

        // The live handle still tears the session down normally.
        assert!(registry.remove("B1", Role::Driver, "P1", &new_tx).await);
        assert_eq!(registry.connection_count().await, 0);
    }
}
