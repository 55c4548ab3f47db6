mod collab;
mod config;
mod db;
mod docs;
mod handlers;
mod models;
mod routes;
mod tracking;
mod ws;

use axum::http::HeaderValue;
use axum::{routing::get, Router};
use std::panic;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use collab::memory::{InMemoryBookingStore, InMemoryUserStore};
use collab::{BookingStore, UserStore};
use config::Config;
use db::store::{PgBookingStore, PgUserStore};
use docs::ApiDoc;
use routes::create_api_routes;
use tracking::lifecycle::TrackingService;
use tracking::registry::ConnectionRegistry;
use tracking::store::SessionStore;
use ws::handler::track_ws;

/// Shared state for all HTTP and WebSocket handlers.
pub struct AppState {
    pub service: Arc<TrackingService>,
    pub ws_public_url: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to info level, but allow debug for our app
            "trip_track=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting server...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });

    // Initialize collaborator stores: database if a URL is provided,
    // in-memory otherwise
    let (bookings, users): (Arc<dyn BookingStore>, Arc<dyn UserStore>) = match &config.db_url {
        Some(db_url) => match db::connect(db_url).await {
            Ok(pool) => {
                info!("Database initialized successfully");
                (
                    Arc::new(PgBookingStore::new(pool.clone())),
                    Arc::new(PgUserStore::new(pool)),
                )
            }
            Err(e) => {
                error!("Failed to initialize database: {}", e);
                warn!("Falling back to in-memory collaborator stores");
                (
                    Arc::new(InMemoryBookingStore::new()),
                    Arc::new(InMemoryUserStore::new()),
                )
            }
        },
        None => {
            warn!("No database URL configured - using in-memory collaborator stores");
            (
                Arc::new(InMemoryBookingStore::new()),
                Arc::new(InMemoryUserStore::new()),
            )
        }
    };

    // Build the tracking service around its own session store and registry
    let service = Arc::new(TrackingService::new(
        Arc::new(SessionStore::new()),
        Arc::new(ConnectionRegistry::new()),
        bookings,
        users,
    ));
    let state = Arc::new(AppState {
        service,
        ws_public_url: config.ws_public_url.clone(),
    });

    // CORS for browser dashboards
    let cors = match &config.cors_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    };

    // Combine all routes
    let app_routes = Router::new()
        // Mount API routes
        .nest("/api", create_api_routes(state.clone()))
        // Tracking socket
        .merge(
            Router::new()
                .route("/ws/track", get(track_ws))
                .with_state(state),
        )
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add tracing + CORS layers
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start the server
    let listener = tokio::net::TcpListener::bind(config.server_address())
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", config.server_address()));

    info!("🚀 Server running on http://{}", config.server_address());
    info!("📡 Tracking socket available at {}/ws/track", config.ws_public_url);
    info!("📚 Swagger UI available at http://{}/swagger", config.server_address());

    axum::serve(listener, app_routes)
        .await
        .expect("Server failed to start");
}
