//! Scoring adapter for the external prediction model
//!
//! Translates a `ParcelContext` into the flat feature vector the model
//! expects and wraps the model behind the [`PredictionModel`] trait so the
//! orchestrator can run against a test double.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use shared::ParcelContext;
use std::collections::BTreeMap;

use crate::error::AppResult;

/// Flat feature vector sent to the prediction model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector {
    pub latitude: f64,
    pub longitude: f64,
    pub crop: String,
    pub target_year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil_ph: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organic_matter_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil_texture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_precipitation_mm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_temperature_celsius: Option<f64>,
    pub climate_days: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_yield_kg_ha: Option<f64>,
}

impl FeatureVector {
    /// Build the feature row from an aggregated parcel context.
    ///
    /// Missing data stays `None`; the model service applies its own
    /// training-time defaults, and the gap is already priced into the
    /// context's completeness score.
    pub fn from_context(ctx: &ParcelContext) -> Self {
        let mean_yield = if ctx.historical_yields.is_empty() {
            None
        } else {
            let sum: f64 = ctx
                .historical_yields
                .values()
                .filter_map(|d| d.to_f64())
                .sum();
            Some(sum / ctx.historical_yields.len() as f64)
        };

        Self {
            latitude: ctx.coordinates.latitude.to_f64().unwrap_or(0.0),
            longitude: ctx.coordinates.longitude.to_f64().unwrap_or(0.0),
            crop: ctx.crop.as_str().to_string(),
            target_year: ctx.campaign.target_year(),
            soil_ph: ctx.soil.as_ref().and_then(|s| s.ph.to_f64()),
            organic_matter_pct: ctx
                .soil
                .as_ref()
                .and_then(|s| s.organic_matter_pct.to_f64()),
            soil_texture: ctx.soil.as_ref().map(|s| s.texture.clone()),
            mean_precipitation_mm: ctx.mean_precipitation_mm().and_then(|d| d.to_f64()),
            mean_temperature_celsius: ctx.mean_temperature_celsius().and_then(|d| d.to_f64()),
            climate_days: ctx.climate_window.len(),
            mean_yield_kg_ha: mean_yield,
        }
    }
}

/// Raw output of one model invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPrediction {
    /// Predicted optimal sowing day within the campaign target year (1-365).
    pub optimal_day_of_year: u32,
    /// Model certainty in [0, 1], before combining with data completeness.
    pub model_confidence: f64,
    /// Named numeric indicators (feature importances, anomaly signals).
    pub indicators: BTreeMap<String, f64>,
    pub model_version: String,
}

/// The external prediction model.
///
/// A failed invocation is reported as `ModelUnavailable` and never retried
/// here; retrying a deterministic model with identical input changes
/// nothing, so retry is left to the caller.
#[async_trait]
pub trait PredictionModel: Send + Sync {
    async fn predict(&self, features: &FeatureVector) -> AppResult<RawPrediction>;
}
