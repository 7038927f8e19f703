//! Recommendation output models
//!
//! The response contract consumed by the presentation layer and persisted
//! (as structured JSON) by the history repository.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::InputSnapshot;
use crate::types::{Campaign, Crop};

/// Risk flag attached when input completeness falls below the configured
/// minimum. Kept in Spanish: it is a contract value the UI matches on.
pub const RISK_INSUFFICIENT_DATA: &str = "datos_insuficientes";

/// Kinds of recommendation the platform can produce.
///
/// Closed enumeration rather than a free-form string; today only sowing
/// recommendations exist.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationType {
    Siembra,
}

/// The principal planting window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationWindow {
    pub optimal_date: NaiveDate,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Normalized combination of model certainty and data completeness.
    pub confidence: f64,
    pub justification: String,
    pub risks: Vec<String>,
    pub indicators: BTreeMap<String, f64>,
}

/// A named climate scenario used to derive an alternative date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClimateScenario {
    pub name: String,
    pub description: String,
    pub precipitation_factor: f64,
    pub temperature_adjustment_celsius: f64,
}

/// A ranked alternative to the principal window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alternative {
    pub date: NaiveDate,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub confidence: f64,
    pub pros: Vec<String>,
    pub contras: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<ClimateScenario>,
}

/// Non-fatal notes attached to a response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    /// Set when the recommendation was served from cache.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub from_cache: bool,
    /// Warnings such as a failed history write; the recommendation itself
    /// is still valid.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Full single-parcel recommendation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendation_id: Uuid,
    pub parcel_id: Uuid,
    pub recommendation_type: RecommendationType,
    pub crop: Crop,
    pub campaign: Campaign,
    pub principal_window: RecommendationWindow,
    pub alternatives: Vec<Alternative>,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_costs: Option<BTreeMap<String, f64>>,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_snapshot: Option<InputSnapshot>,
}

/// Machine-readable classification of a per-parcel failure
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DataUnavailable,
    ModelUnavailable,
    ValidationError,
    StorageError,
    Internal,
}

/// Error entry for a failed parcel in a bulk request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItemError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Per-parcel entry in a bulk response, in original request order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItem {
    pub parcel_id: Uuid,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<RecommendationResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<BulkItemError>,
}

impl BulkItem {
    pub fn ok(parcel_id: Uuid, response: RecommendationResponse) -> Self {
        Self {
            parcel_id,
            success: true,
            response: Some(response),
            error: None,
        }
    }

    pub fn failed(parcel_id: Uuid, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            parcel_id,
            success: false,
            response: None,
            error: Some(BulkItemError {
                kind,
                message: message.into(),
            }),
        }
    }
}

/// Aggregate bulk response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkRecommendationResponse {
    pub results: Vec<BulkItem>,
    pub had_partial_failures: bool,
}

/// Immutable persisted snapshot of a generated recommendation.
///
/// Append-only: created on every cache-miss computation, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub parcel_id: Uuid,
    pub client_id: Uuid,
    pub crop: Crop,
    pub campaign: String,
    pub created_at: DateTime<Utc>,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub principal_window: serde_json::Value,
    pub alternatives: serde_json::Value,
    pub confidence: f64,
    pub input_snapshot: serde_json::Value,
    pub model_version: Option<String>,
}
