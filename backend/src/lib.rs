//! Planting Recommendation Platform - backend library
//!
//! Aggregates soil, climate, and yield data per parcel, invokes the trained
//! sowing-date model, shapes the result into a principal window plus ranked
//! alternatives, and mediates caching and history persistence.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod routes;
pub mod services;

pub use config::Config;

use services::cache::CacheStore;
use services::scoring::PredictionModel;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    /// Prediction model client, shared so bulk requests reuse connections.
    pub model: Arc<dyn PredictionModel>,
    /// Recommendation cache, shared across requests within the process.
    pub cache: Arc<dyn CacheStore>,
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Planting Recommendation Platform API v1.0"
}
