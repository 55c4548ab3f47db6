//! Authorization gate for joining a tracking session.

use std::sync::Arc;
use tracing::{info, warn};

use super::store::SessionStore;
use crate::collab::BookingStore;
use crate::models::Role;

/// Checks a claimed `(sessionId, role, userId)` against the booking it refers
/// to. This is the sole gate before a connection may join; it is re-run on
/// every connection attempt and never cached across reconnects.
pub struct SessionValidator {
    bookings: Arc<dyn BookingStore>,
    sessions: Arc<SessionStore>,
}

impl SessionValidator {
    pub fn new(bookings: Arc<dyn BookingStore>, sessions: Arc<SessionStore>) -> Self {
        Self { bookings, sessions }
    }

    /// Returns `true` when the identity is permitted to join the session.
    /// On success the participant is registered in the session store (creating
    /// the session record if absent). Collaborator failures fail closed.
    pub async fn validate(&self, session_id: &str, role: Role, user_id: &str) -> bool {
        let booking = match self.bookings.booking(session_id).await {
            Ok(Some(booking)) => booking,
            Ok(None) => {
                warn!("Validation failed: no booking found for session {}", session_id);
                return false;
            }
            Err(e) => {
                warn!("Validation failed: booking lookup for session {} errored: {}", session_id, e);
                return false;
            }
        };

        if !booking.status.is_tracking_eligible() {
            info!(
                "Validation failed: booking {} is '{}', not tracking-eligible",
                session_id, booking.status
            );
            return false;
        }

        let authorized = match role.expected_service() {
            Some(expected) => {
                booking.service_type == expected && booking.provider_id == user_id
            }
            None => booking.customer_id == user_id,
        };
        if !authorized {
            warn!(
                "Validation failed: {} '{}' is not a participant of booking {}",
                role, user_id, session_id
            );
            return false;
        }

        self.sessions
            .register_participant(session_id, role, user_id)
            .await;
        info!("Validated {} '{}' for session {}", role, user_id, session_id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::fixtures::booking;
    use crate::collab::memory::InMemoryBookingStore;
    use crate::models::{BookingStatus, ServiceType};

    async fn setup(status: BookingStatus) -> (SessionValidator, Arc<SessionStore>) {
        let bookings = Arc::new(InMemoryBookingStore::new());
        bookings.insert(booking("B1", "P1", "C1", status)).await;
        let sessions = Arc::new(SessionStore::new());
        (
            SessionValidator::new(bookings, sessions.clone()),
            sessions,
        )
    }

    #[tokio::test]
    async fn assigned_driver_is_accepted() {
        let (validator, sessions) = setup(BookingStatus::Accepted).await;
        assert!(validator.validate("B1", Role::Driver, "P1").await);
        let session = sessions.get("B1").await.unwrap();
        assert!(session.participants.contains("driver_P1"));
    }

    #[tokio::test]
    async fn booking_customer_is_accepted() {
        let (validator, _) = setup(BookingStatus::InProgress).await;
        assert!(validator.validate("B1", Role::Customer, "C1").await);
    }

    #[tokio::test]
    async fn mismatched_identity_is_rejected_without_state_changes() {
        let (validator, sessions) = setup(BookingStatus::Accepted).await;
        assert!(!validator.validate("B1", Role::Driver, "P2").await);
        assert!(!validator.validate("B1", Role::Customer, "C2").await);
        assert!(sessions.get("B1").await.is_none());
    }

    #[tokio::test]
    async fn provider_role_must_match_service_type() {
        // Booking fixture is a driver booking; a caretaker claim with the
        // right user id must still be refused.
        let (validator, _) = setup(BookingStatus::Accepted).await;
        assert!(!validator.validate("B1", Role::Caretaker, "P1").await);
        assert_eq!(Role::Driver.expected_service(), Some(ServiceType::Driver));
    }

    #[tokio::test]
    async fn finished_bookings_reject_new_joins() {
        let (validator, _) = setup(BookingStatus::Completed).await;
        assert!(!validator.validate("B1", Role::Driver, "P1").await);
        let (validator, _) = setup(BookingStatus::Cancelled).await;
        assert!(!validator.validate("B1", Role::Customer, "C1").await);
    }

    #[tokio::test]
    async fn unknown_booking_is_rejected() {
        let (validator, sessions) = setup(BookingStatus::Accepted).await;
        assert!(!validator.validate("B9", Role::Driver, "P1").await);
        assert!(sessions.get("B9").await.is_none());
    }
}
