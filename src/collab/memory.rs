//! In-memory collaborator stores.
//!
//! Used when no database URL is configured, and as fixtures in tests.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{BookingStore, StoreError, UserStore};
use crate::models::{Booking, BookingPatch, GeoPoint, User};

#[derive(Default)]
pub struct InMemoryBookingStore {
    bookings: RwLock<HashMap<String, Booking>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, booking: Booking) {
        self.bookings
            .write()
            .await
            .insert(booking.id.clone(), booking);
    }
}

fn apply_patch(booking: &mut Booking, patch: BookingPatch) {
    if let Some(status) = patch.status {
        booking.status = status;
    }
    if let Some(eta) = patch.eta {
        booking.eta = Some(eta);
    }
    if patch.eta_updated_at.is_some() {
        booking.eta_updated_at = patch.eta_updated_at;
    }
    if patch.current_location.is_some() {
        booking.current_location = patch.current_location;
    }
    // Start/end stamps have no dedicated read-side field here; the live
    // booking row keeps them, the tracking core only ever writes them.
    let _ = (patch.started_at, patch.ended_at);
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn booking(&self, id: &str) -> Result<Option<Booking>, StoreError> {
        Ok(self.bookings.read().await.get(id).cloned())
    }

    async fn update_booking(&self, id: &str, patch: BookingPatch) -> Result<(), StoreError> {
        let mut bookings = self.bookings.write().await;
        match bookings.get_mut(id) {
            Some(booking) => {
                apply_patch(booking, patch);
                Ok(())
            }
            None => Err(StoreError::Backend(format!("booking '{}' not found", id))),
        }
    }
}

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn update_user_location(&self, id: &str, location: GeoPoint) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(id) {
            Some(user) => {
                user.location = Some(location);
                Ok(())
            }
            None => Err(StoreError::Backend(format!("user '{}' not found", id))),
        }
    }
}
