//! Postgres-backed collaborator stores.
//!
//! The tracking core only reads a handful of booking/user fields and writes
//! partial updates; schema ownership stays with the booking platform.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use sqlx::Row;

use crate::collab::{BookingStore, StoreError, UserStore};
use crate::models::{
    Booking, BookingPatch, BookingStatus, EtaValue, GeoPoint, Place, ServiceType, TrackedLocation,
    User, VehicleDetails,
};

pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn booking(&self, id: &str) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, status, provider_id, customer_id, service_type,
                   pickup_location, drop_location, eta, eta_updated_at,
                   current_location, vehicle_details, fare, distance, created_at
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let service_type: String = row.try_get("service_type")?;
        let service_type = service_type
            .parse::<ServiceType>()
            .map_err(StoreError::Backend)?;

        Ok(Some(Booking {
            id: row.try_get("id")?,
            status: BookingStatus::from(row.try_get::<String, _>("status")?),
            provider_id: row.try_get("provider_id")?,
            customer_id: row.try_get("customer_id")?,
            service_type,
            pickup_location: row
                .try_get::<Option<Json<Place>>, _>("pickup_location")?
                .map(|j| j.0),
            drop_location: row
                .try_get::<Option<Json<Place>>, _>("drop_location")?
                .map(|j| j.0),
            eta: row.try_get::<Option<Json<EtaValue>>, _>("eta")?.map(|j| j.0),
            eta_updated_at: row.try_get::<Option<DateTime<Utc>>, _>("eta_updated_at")?,
            current_location: row
                .try_get::<Option<Json<TrackedLocation>>, _>("current_location")?
                .map(|j| j.0),
            vehicle_details: row
                .try_get::<Option<Json<VehicleDetails>>, _>("vehicle_details")?
                .map(|j| j.0),
            fare: row.try_get("fare")?,
            distance: row.try_get("distance")?,
            created_at: row.try_get("created_at")?,
        }))
    }

    async fn update_booking(&self, id: &str, patch: BookingPatch) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                status           = COALESCE($2, status),
                started_at       = COALESCE($3, started_at),
                ended_at         = COALESCE($4, ended_at),
                eta              = COALESCE($5, eta),
                eta_updated_at   = COALESCE($6, eta_updated_at),
                current_location = COALESCE($7, current_location)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(patch.status.map(String::from))
        .bind(patch.started_at)
        .bind(patch.ended_at)
        .bind(patch.eta.map(Json))
        .bind(patch.eta_updated_at)
        .bind(patch.current_location.map(Json))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Backend(format!("booking '{}' not found", id)));
        }
        Ok(())
    }
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, first_name, last_name, phone, profile_image, location
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(User {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            phone: row.try_get("phone")?,
            profile_image: row.try_get("profile_image")?,
            location: row
                .try_get::<Option<Json<GeoPoint>>, _>("location")?
                .map(|j| j.0),
        }))
    }

    async fn update_user_location(&self, id: &str, location: GeoPoint) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET location = $2 WHERE id = $1")
            .bind(id)
            .bind(Json(location))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Backend(format!("user '{}' not found", id)));
        }
        Ok(())
    }
}
