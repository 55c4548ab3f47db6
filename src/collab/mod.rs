pub mod memory;


use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Booking, BookingPatch, GeoPoint, User};

/// Failure talking to a collaborator store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store error: {0}")]
    Backend(String),
}

/// Booking lookup and partial-update collaborator.
///
/// The tracking core never owns booking data; it reads the fields it needs for
/// authorization and route replay, and writes back status/eta/location updates.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn booking(&self, id: &str) -> Result<Option<Booking>, StoreError>;
    async fn update_booking(&self, id: &str, patch: BookingPatch) -> Result<(), StoreError>;
}

/// User lookup and last-known-location collaborator.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn user(&self, id: &str) -> Result<Option<User>, StoreError>;
    async fn update_user_location(&self, id: &str, location: GeoPoint) -> Result<(), StoreError>;
}
