pub mod store;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

/// Create the shared connection pool for the collaborator stores.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2) // Keep some connections alive
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600)) // Close idle connections after 10 minutes
        .max_lifetime(Duration::from_secs(1800)) // Recycle connections after 30 minutes
        .connect(database_url)
        .await?;

    info!("Database connection pool created successfully");
    Ok(pool)
}
