//! HTTP client for the prediction model microservice
//!
//! The trained sowing-date model runs as a separate service; this client
//! posts a feature vector and maps the reply into the domain's raw
//! prediction shape.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::ModelConfig;
use crate::error::{AppError, AppResult};
use crate::services::scoring::{FeatureVector, PredictionModel, RawPrediction};

/// Client for the prediction model service
#[derive(Clone)]
pub struct HttpModelClient {
    endpoint: String,
    model_name: String,
    http_client: Client,
}

/// Request to score a feature vector
#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    model: &'a str,
    features: &'a FeatureVector,
}

/// Response from the prediction service
#[derive(Debug, Deserialize)]
struct PredictResponse {
    day_of_year: u32,
    confidence: f64,
    #[serde(default)]
    indicators: BTreeMap<String, f64>,
    model_version: String,
}

impl HttpModelClient {
    pub fn new(config: &ModelConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Configuration(format!("model HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            model_name: config.name.clone(),
            http_client,
        })
    }
}

#[async_trait]
impl PredictionModel for HttpModelClient {
    async fn predict(&self, features: &FeatureVector) -> AppResult<RawPrediction> {
        let url = format!("{}/predict", self.endpoint);
        let request = PredictRequest {
            model: &self.model_name,
            features,
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ModelUnavailable(format!("invocation failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, %body, "Prediction service returned an error");
            return Err(AppError::ModelUnavailable(format!(
                "service returned {}",
                status
            )));
        }

        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| AppError::ModelUnavailable(format!("invalid response: {}", e)))?;

        if parsed.day_of_year == 0 || parsed.day_of_year > 365 {
            return Err(AppError::ModelUnavailable(format!(
                "day_of_year out of range: {}",
                parsed.day_of_year
            )));
        }

        Ok(RawPrediction {
            optimal_day_of_year: parsed.day_of_year,
            model_confidence: parsed.confidence.clamp(0.0, 1.0),
            indicators: parsed.indicators,
            model_version: parsed.model_version,
        })
    }
}
