//! Recommendation orchestration service
//!
//! Runs the per-parcel pipeline (cache → aggregate → score → build →
//! persist) and fans it out across parcels for bulk requests with bounded
//! concurrency and per-parcel failure isolation.

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use uuid::Uuid;
use validator::Validate;

use shared::{
    BulkItem, BulkRecommendationResponse, Campaign, Crop, HistoryRecord, InputSnapshot,
    RecommendationResponse, RecommendationType, ResponseMetadata,
};

use crate::config::RecommendationConfig;
use crate::error::{AppError, AppResult};
use crate::services::aggregator::ContextSource;
use crate::services::builder::RecommendationBuilder;
use crate::services::cache::{end_of_day, fingerprint, CacheEntry, CacheStore};
use crate::services::history::HistoryStore;
use crate::services::scoring::{FeatureVector, PredictionModel};

/// Single-parcel recommendation request
#[derive(Debug, Clone, Deserialize)]
pub struct SiembraRequest {
    pub parcel_id: Uuid,
    pub client_id: Uuid,
    pub crop: Crop,
    pub campaign: Campaign,
    /// Defaults to today when omitted.
    pub as_of_date: Option<NaiveDate>,
}

/// Multi-parcel recommendation request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BulkSiembraRequest {
    #[validate(length(min = 1, max = 200, message = "between 1 and 200 parcel ids required"))]
    pub parcel_ids: Vec<Uuid>,
    pub client_id: Uuid,
    pub crop: Crop,
    pub campaign: Campaign,
    pub as_of_date: Option<NaiveDate>,
}

/// Orchestrates the full recommendation pipeline.
///
/// All collaborators are injected behind traits so tests can substitute
/// doubles; the service itself holds no mutable state and is cheap to clone.
#[derive(Clone)]
pub struct RecommendationService {
    context_source: Arc<dyn ContextSource>,
    model: Arc<dyn PredictionModel>,
    cache: Arc<dyn CacheStore>,
    history: Arc<dyn HistoryStore>,
    builder: RecommendationBuilder,
    persist_on_cache_hit: bool,
    bulk_concurrency: usize,
}

impl RecommendationService {
    pub fn new(
        context_source: Arc<dyn ContextSource>,
        model: Arc<dyn PredictionModel>,
        cache: Arc<dyn CacheStore>,
        history: Arc<dyn HistoryStore>,
        config: &RecommendationConfig,
    ) -> Self {
        Self {
            context_source,
            model,
            cache,
            history,
            builder: RecommendationBuilder::new(config),
            persist_on_cache_hit: config.persist_on_cache_hit,
            bulk_concurrency: config.bulk_concurrency.max(1),
        }
    }

    /// Generate (or serve from cache) one sowing recommendation.
    pub async fn recommend(&self, request: &SiembraRequest) -> AppResult<RecommendationResponse> {
        let as_of = request.as_of_date.unwrap_or_else(|| Utc::now().date_naive());
        let key = fingerprint(request.parcel_id, request.crop, &request.campaign, as_of);

        // A failed cache read degrades to recomputation, never to an error.
        match self.cache.get(&key).await {
            Ok(Some(entry)) => {
                tracing::debug!(parcel_id = %request.parcel_id, "Cache hit");
                let mut response = entry.payload;
                let metadata = response.metadata.get_or_insert_with(ResponseMetadata::default);
                metadata.from_cache = true;

                if self.persist_on_cache_hit {
                    self.append_history(&mut response, request).await;
                }
                return Ok(response);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Cache read failed, recomputing");
            }
        }

        let context = self
            .context_source
            .load(request.parcel_id, request.crop, &request.campaign, as_of)
            .await?;

        let features = FeatureVector::from_context(&context);
        let raw = self.model.predict(&features).await?;

        let (principal_window, alternatives) = self.builder.build(&context, &raw)?;

        let generated_at = Utc::now();
        let confidence = principal_window.confidence;
        let mut response = RecommendationResponse {
            recommendation_id: Uuid::new_v4(),
            parcel_id: request.parcel_id,
            recommendation_type: RecommendationType::Siembra,
            crop: request.crop,
            campaign: request.campaign.clone(),
            principal_window,
            alternatives,
            confidence,
            estimated_costs: None,
            generated_at,
            metadata: Some(ResponseMetadata {
                model_version: Some(raw.model_version.clone()),
                from_cache: false,
                warnings: Vec::new(),
            }),
            input_snapshot: Some(InputSnapshot::from_context(&context, generated_at)),
        };

        // Store the clean payload; warnings about this request's own
        // persistence don't belong in tomorrow's cache hits.
        if let Err(e) = self
            .cache
            .put(CacheEntry {
                fingerprint: key,
                payload: response.clone(),
                expires_at: end_of_day(generated_at),
            })
            .await
        {
            tracing::warn!(error = %e, "Cache write failed");
        }

        self.append_history(&mut response, request).await;

        tracing::info!(
            parcel_id = %request.parcel_id,
            crop = %request.crop,
            campaign = %request.campaign,
            optimal_date = %response.principal_window.optimal_date,
            confidence = response.confidence,
            "Sowing recommendation generated"
        );

        Ok(response)
    }

    /// Fan the pipeline out over a list of parcels.
    ///
    /// Failures are isolated per parcel and the result array always matches
    /// the request order, regardless of completion order.
    pub async fn recommend_bulk(
        &self,
        request: &BulkSiembraRequest,
    ) -> AppResult<BulkRecommendationResponse> {
        request
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let semaphore = Arc::new(Semaphore::new(self.bulk_concurrency));
        let mut handles = Vec::with_capacity(request.parcel_ids.len());

        for &parcel_id in &request.parcel_ids {
            let service = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let single = SiembraRequest {
                parcel_id,
                client_id: request.client_id,
                crop: request.crop,
                campaign: request.campaign.clone(),
                as_of_date: request.as_of_date,
            };

            handles.push(tokio::spawn(async move {
                // The semaphore lives for the whole fan-out and is never
                // closed, so a failed acquire means the bulk request itself
                // is being torn down.
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return BulkItem::failed(
                            parcel_id,
                            shared::ErrorKind::Internal,
                            "bulk scheduler shut down".to_string(),
                        )
                    }
                };
                match service.recommend(&single).await {
                    Ok(response) => BulkItem::ok(parcel_id, response),
                    Err(e) => {
                        tracing::warn!(
                            %parcel_id,
                            error = %e,
                            "Parcel failed within bulk request"
                        );
                        BulkItem::failed(parcel_id, e.kind(), e.to_string())
                    }
                }
            }));
        }

        // Awaiting handles in spawn order keeps results indexed by request
        // position even though completion order is unconstrained.
        let mut results = Vec::with_capacity(request.parcel_ids.len());
        for (handle, &parcel_id) in handles.into_iter().zip(&request.parcel_ids) {
            let item = match handle.await {
                Ok(item) => item,
                Err(e) => BulkItem::failed(
                    parcel_id,
                    shared::ErrorKind::Internal,
                    format!("task aborted: {}", e),
                ),
            };
            results.push(item);
        }

        let had_partial_failures = results.iter().any(|item| !item.success);

        Ok(BulkRecommendationResponse {
            results,
            had_partial_failures,
        })
    }

    /// Append the history record, degrading a storage failure to a warning
    /// in the response metadata.
    async fn append_history(&self, response: &mut RecommendationResponse, request: &SiembraRequest) {
        let record = match history_record(response, request.client_id) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Could not serialize history record");
                return;
            }
        };

        if let Err(e) = self.history.append(&record).await {
            tracing::warn!(
                parcel_id = %request.parcel_id,
                error = %e,
                "History write failed, returning recommendation anyway"
            );
            response
                .metadata
                .get_or_insert_with(ResponseMetadata::default)
                .warnings
                .push(format!("history write failed: {}", e));
        }
    }
}

/// Build the immutable history snapshot from a computed response
fn history_record(
    response: &RecommendationResponse,
    client_id: Uuid,
) -> AppResult<HistoryRecord> {
    // Every append gets its own key: with persist-on-cache-hit enabled the
    // same recommendation can legitimately be recorded more than once.
    Ok(HistoryRecord {
        id: Uuid::new_v4(),
        parcel_id: response.parcel_id,
        client_id,
        crop: response.crop,
        campaign: response.campaign.as_str().to_string(),
        created_at: response.generated_at,
        valid_from: Some(response.principal_window.start),
        valid_until: Some(response.principal_window.end),
        principal_window: serde_json::to_value(&response.principal_window)
            .map_err(|e| AppError::Internal(e.to_string()))?,
        alternatives: serde_json::to_value(&response.alternatives)
            .map_err(|e| AppError::Internal(e.to_string()))?,
        confidence: response.confidence,
        input_snapshot: serde_json::to_value(&response.input_snapshot)
            .map_err(|e| AppError::Internal(e.to_string()))?,
        model_version: response
            .metadata
            .as_ref()
            .and_then(|m| m.model_version.clone()),
    })
}
