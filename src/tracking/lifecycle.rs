//! Session lifecycle orchestration: creation on booking acceptance, initial
//! state replay for new connections, and teardown on last disconnect.

use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use super::registry::{send_to, ConnectionRegistry, ConnectionSender};
use super::router::MessageRouter;
use super::store::{SessionStore, TrackingSession};
use super::validator::SessionValidator;
use crate::collab::{BookingStore, StoreError, UserStore};
use crate::models::{
    BookingPatch, ClientMessage, ProviderSummary, Role, RouteData, ServerMessage, ServiceType,
    TrackedLocation,
};

#[derive(Debug, Error)]
pub enum CreateSessionError {
    #[error("booking '{0}' not found")]
    BookingNotFound(String),
    #[error("provider '{0}' not found")]
    ProviderNotFound(String),
    #[error("customer '{0}' not found")]
    CustomerNotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The tracking service. Owns the session store and connection registry
/// (injected, so tests can build isolated instances) and wires the validator
/// and router around them.
pub struct TrackingService {
    sessions: Arc<SessionStore>,
    registry: Arc<ConnectionRegistry>,
    bookings: Arc<dyn BookingStore>,
    users: Arc<dyn UserStore>,
    validator: SessionValidator,
    router: MessageRouter,
}

impl TrackingService {
    pub fn new(
        sessions: Arc<SessionStore>,
        registry: Arc<ConnectionRegistry>,
        bookings: Arc<dyn BookingStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        let validator = SessionValidator::new(bookings.clone(), sessions.clone());
        let router = MessageRouter::new(
            sessions.clone(),
            registry.clone(),
            bookings.clone(),
            users.clone(),
        );
        Self {
            sessions,
            registry,
            bookings,
            users,
            validator,
            router,
        }
    }

    /// Explicitly open a session when a booking transitions to accepted.
    /// Verifies that booking, provider and customer all resolve, then
    /// pre-registers both participant keys without requiring a connection.
    pub async fn create_session(
        &self,
        booking_id: &str,
        provider_id: &str,
        customer_id: &str,
        service_type: ServiceType,
    ) -> Result<String, CreateSessionError> {
        if self.bookings.booking(booking_id).await?.is_none() {
            return Err(CreateSessionError::BookingNotFound(booking_id.to_string()));
        }
        if self.users.user(provider_id).await?.is_none() {
            return Err(CreateSessionError::ProviderNotFound(provider_id.to_string()));
        }
        if self.users.user(customer_id).await?.is_none() {
            return Err(CreateSessionError::CustomerNotFound(customer_id.to_string()));
        }

        let provider_role = Role::for_service(service_type);
        self.sessions
            .register_participant(booking_id, provider_role, provider_id)
            .await;
        self.sessions
            .register_participant(booking_id, Role::Customer, customer_id)
            .await;
        info!(
            "Tracking session {} created for {} '{}' and customer '{}'",
            booking_id, provider_role, provider_id, customer_id
        );
        Ok(booking_id.to_string())
    }

    /// Read-only projection for status polling.
    pub async fn session(&self, session_id: &str) -> Option<TrackingSession> {
        self.sessions.get(session_id).await
    }

    /// Run the authorization gate without attaching a connection. Used by the
    /// connection-url endpoint and the REST fallbacks.
    pub async fn validate(&self, session_id: &str, role: Role, user_id: &str) -> bool {
        self.validator.validate(session_id, role, user_id).await
    }

    /// Attach a connection: validate, register the handle, replay initial
    /// state. Returns `false` (with no state mutated) when validation fails.
    pub async fn connect(
        &self,
        session_id: &str,
        role: Role,
        user_id: &str,
        tx: ConnectionSender,
    ) -> bool {
        if !self.validator.validate(session_id, role, user_id).await {
            return false;
        }
        self.registry.add(session_id, role, user_id, tx.clone()).await;
        self.send_initial_data(&tx, session_id, role).await;
        info!("{} '{}' joined session {}", role, user_id, session_id);
        true
    }

    /// Route one inbound message from a connected participant.
    pub async fn handle_message(
        &self,
        session_id: &str,
        role: Role,
        user_id: &str,
        message: ClientMessage,
    ) {
        self.router.handle(session_id, role, user_id, message).await;
    }

    /// Detach a connection. `tx` identifies the handle being detached, so a
    /// socket that was superseded by a reconnect cannot evict the live one.
    /// When the last connection of a session goes away the session is flushed
    /// and deleted; the flush writes the final location to the Booking store
    /// only for provider-role disconnects (customers never produce location,
    /// every provider sample was already persisted on the hot path).
    pub async fn disconnect(
        &self,
        session_id: &str,
        role: Role,
        user_id: &str,
        tx: &ConnectionSender,
    ) {
        let session_empty = self.registry.remove(session_id, role, user_id, tx).await;
        info!("{} '{}' left session {}", role, user_id, session_id);
        if !session_empty {
            return;
        }

        let Some(session) = self.sessions.remove(session_id).await else {
            return;
        };
        if role.is_provider() {
            if let Some(location) = session.last_location {
                let patch = BookingPatch {
                    current_location: Some(location),
                    ..Default::default()
                };
                if let Err(e) = self.bookings.update_booking(session_id, patch).await {
                    error!("Failed to flush final location for booking {}: {}", session_id, e);
                }
            }
        }
        info!("Tracking session {} torn down", session_id);
    }

    /// Replay current state to a newly joined connection. A joining customer
    /// additionally receives the route overview and the last persisted ETA,
    /// both sourced from the collaborators rather than session state.
    async fn send_initial_data(&self, tx: &ConnectionSender, session_id: &str, role: Role) {
        let session = self.sessions.get(session_id).await;
        let in_memory_location = session.and_then(|s| s.last_location);

        let booking = if in_memory_location.is_none() || role == Role::Customer {
            match self.bookings.booking(session_id).await {
                Ok(booking) => booking,
                Err(e) => {
                    error!("Failed to load booking {} for initial data: {}", session_id, e);
                    None
                }
            }
        } else {
            None
        };

        // Fresh in-memory state wins; the persisted location is the fallback
        // after a process restart.
        let location = in_memory_location
            .or_else(|| booking.as_ref().and_then(|b| b.current_location.clone()));
        if let Some(location) = location {
            send_to(tx, &ServerMessage::LocationUpdate(location));
        }

        if role != Role::Customer {
            return;
        }
        let Some(booking) = booking else {
            return;
        };

        let provider = match self.users.user(&booking.provider_id).await {
            Ok(Some(user)) => Some(ProviderSummary {
                id: user.id,
                first_name: user.first_name,
                last_name: user.last_name,
                phone: user.phone,
                profile_image: user.profile_image,
            }),
            Ok(None) => None,
            Err(e) => {
                error!("Failed to load provider {} for initial data: {}", booking.provider_id, e);
                None
            }
        };

        send_to(
            tx,
            &ServerMessage::RouteData(RouteData {
                booking_id: booking.id.clone(),
                status: booking.status.clone(),
                pickup_location: booking.pickup_location.clone(),
                drop_location: booking.drop_location.clone(),
                provider,
                vehicle_details: booking.vehicle_details.clone(),
                fare: booking.fare,
                distance: booking.distance,
            }),
        );

        if let (Some(eta), Some(eta_updated_at)) = (booking.eta, booking.eta_updated_at) {
            send_to(tx, &ServerMessage::EtaUpdate { eta, eta_updated_at });
        }
    }

    /// Last persisted trip location, for the REST polling fallback when the
    /// in-memory session holds nothing.
    pub async fn booking_location(
        &self,
        session_id: &str,
    ) -> Result<Option<TrackedLocation>, StoreError> {
        Ok(self
            .bookings
            .booking(session_id)
            .await?
            .and_then(|b| b.current_location))
    }

    /// `(active sessions, open connections)` for diagnostics.
    pub async fn stats(&self) -> (usize, usize) {
        (
            self.sessions.len().await,
            self.registry.connection_count().await,
        )
    }
}
