//! Route definitions for the Planting Recommendation Platform

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Recommendation endpoints
        .nest("/recommendations", recommendation_routes())
}

/// Recommendation routes
fn recommendation_routes() -> Router<AppState> {
    Router::new()
        .route("/siembra", post(handlers::recommend_siembra))
        .route("/siembra/bulk", post(handlers::recommend_siembra_bulk))
        .route("/history", get(handlers::get_history))
}
