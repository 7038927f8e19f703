//! Recommendation HTTP handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use shared::{Campaign, Crop, Pagination};

use crate::error::AppError;
use crate::services::aggregator::PgFeatureAggregator;
use crate::services::history::{HistoryFilters, HistoryStore, PgHistoryRepository};
use crate::services::recommendation::{BulkSiembraRequest, RecommendationService, SiembraRequest};
use crate::AppState;

/// Assemble the orchestration service with its Postgres-backed
/// collaborators and the shared model client and cache.
fn recommendation_service(state: &AppState) -> RecommendationService {
    RecommendationService::new(
        Arc::new(PgFeatureAggregator::new(
            state.db.clone(),
            state.config.recommendation.climate_window_days,
        )),
        state.model.clone(),
        state.cache.clone(),
        Arc::new(PgHistoryRepository::new(state.db.clone())),
        &state.config.recommendation,
    )
}

/// Generate a sowing recommendation for one parcel
pub async fn recommend_siembra(
    State(state): State<AppState>,
    Json(request): Json<SiembraRequest>,
) -> impl IntoResponse {
    let service = recommendation_service(&state);

    match service.recommend(&request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Generate sowing recommendations for a batch of parcels
pub async fn recommend_siembra_bulk(
    State(state): State<AppState>,
    Json(request): Json<BulkSiembraRequest>,
) -> impl IntoResponse {
    let service = recommendation_service(&state);

    match service.recommend_bulk(&request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Query parameters for the history endpoint
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub client_id: Option<Uuid>,
    pub parcel_id: Option<Uuid>,
    pub crop: Option<String>,
    pub campaign: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// List previously generated recommendations, newest first
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let crop = match query.crop.as_deref().map(str::parse::<Crop>).transpose() {
        Ok(crop) => crop,
        Err(e) => return AppError::ValidationError(e).into_response(),
    };
    let campaign = match query.campaign.as_deref().map(Campaign::parse).transpose() {
        Ok(campaign) => campaign.map(|c| c.as_str().to_string()),
        Err(e) => return AppError::ValidationError(e).into_response(),
    };

    let filters = HistoryFilters {
        client_id: query.client_id,
        parcel_id: query.parcel_id,
        crop,
        campaign,
    };
    let pagination = Pagination {
        limit: query.limit.unwrap_or(Pagination::default().limit),
        offset: query.offset.unwrap_or(0),
    };

    let repository = PgHistoryRepository::new(state.db.clone());
    match repository.query(&filters, pagination).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => e.into_response(),
    }
}
