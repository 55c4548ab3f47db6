//! Dispatch of inbound tracking messages.
//!
//! Persistence runs as spawned tasks so a slow collaborator never delays the
//! live broadcast; tracking is a best-effort feed, not a transactional ledger.

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, warn};

use super::registry::ConnectionRegistry;
use super::store::SessionStore;
use crate::collab::{BookingStore, UserStore};
use crate::models::{
    map_transport_status, BookingPatch, ClientMessage, EtaData, LocationFix, Role, ServerMessage,
    StatusData,
};

pub struct MessageRouter {
    sessions: Arc<SessionStore>,
    registry: Arc<ConnectionRegistry>,
    bookings: Arc<dyn BookingStore>,
    users: Arc<dyn UserStore>,
}

impl MessageRouter {
    pub fn new(
        sessions: Arc<SessionStore>,
        registry: Arc<ConnectionRegistry>,
        bookings: Arc<dyn BookingStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            sessions,
            registry,
            bookings,
            users,
        }
    }

    /// Handle one inbound message from an already-validated participant.
    /// Malformed or unauthorized messages are logged and dropped; no error
    /// frame goes back to the sender.
    pub async fn handle(&self, session_id: &str, role: Role, user_id: &str, message: ClientMessage) {
        match message {
            ClientMessage::LocationUpdate(fix) => {
                self.handle_location(session_id, role, user_id, fix).await
            }
            ClientMessage::EtaUpdate(eta) => self.handle_eta(session_id, eta).await,
            ClientMessage::StatusUpdate(status) => {
                self.handle_status(session_id, role, user_id, status).await
            }
        }
    }

    async fn handle_location(&self, session_id: &str, role: Role, user_id: &str, fix: LocationFix) {
        if !role.is_provider() {
            warn!(
                "Dropping location update from {} '{}' in session {}: customers never write location",
                role, user_id, session_id
            );
            return;
        }

        let now = Utc::now();
        let Some(location) = self.sessions.record_location(session_id, &fix, now).await else {
            warn!("Dropping location update for unknown session {}", session_id);
            return;
        };

        // Persist off the hot path; the broadcast below does not wait on it.
        let bookings = self.bookings.clone();
        let users = self.users.clone();
        let booking_id = session_id.to_string();
        let provider_id = user_id.to_string();
        let persisted = location.clone();
        tokio::spawn(async move {
            if let Err(e) = users
                .update_user_location(&provider_id, persisted.point())
                .await
            {
                error!("Failed to persist location for user {}: {}", provider_id, e);
            }
            let patch = BookingPatch {
                current_location: Some(persisted),
                ..Default::default()
            };
            if let Err(e) = bookings.update_booking(&booking_id, patch).await {
                error!("Failed to persist location for booking {}: {}", booking_id, e);
            }
        });

        self.registry
            .broadcast(session_id, &ServerMessage::LocationUpdate(location))
            .await;
    }

    async fn handle_eta(&self, session_id: &str, eta: EtaData) {
        if eta.eta.is_empty() {
            warn!("Dropping empty eta update for session {}", session_id);
            return;
        }

        let now = Utc::now();
        let bookings = self.bookings.clone();
        let booking_id = session_id.to_string();
        let persisted = eta.eta.clone();
        tokio::spawn(async move {
            let patch = BookingPatch {
                eta: Some(persisted),
                eta_updated_at: Some(now),
                ..Default::default()
            };
            if let Err(e) = bookings.update_booking(&booking_id, patch).await {
                error!("Failed to persist eta for booking {}: {}", booking_id, e);
            }
        });

        self.registry
            .broadcast(
                session_id,
                &ServerMessage::EtaUpdate {
                    eta: eta.eta,
                    eta_updated_at: now,
                },
            )
            .await;
    }

    async fn handle_status(&self, session_id: &str, role: Role, user_id: &str, status: StatusData) {
        if status.status.trim().is_empty() {
            warn!("Dropping empty status update for session {}", session_id);
            return;
        }

        let patch = map_transport_status(&status.status, Utc::now());
        let bookings = self.bookings.clone();
        let booking_id = session_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = bookings.update_booking(&booking_id, patch).await {
                error!("Failed to persist status for booking {}: {}", booking_id, e);
            }
        });

        // The broadcast carries the original transport status, not the mapped
        // booking vocabulary.
        self.registry
            .broadcast(
                session_id,
                &ServerMessage::StatusUpdate {
                    status: status.status,
                    role,
                    user_id: user_id.to_string(),
                },
            )
            .await;
    }
}
