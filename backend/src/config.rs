//! Configuration management for the Planting Recommendation Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with APR_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Prediction model service configuration
    pub model: ModelConfig,

    /// Recommendation tuning parameters
    pub recommendation: RecommendationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Prediction model service endpoint
    pub endpoint: String,

    /// Name of the model to invoke
    pub name: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecommendationConfig {
    /// Days before/after the optimal date for the principal window
    pub window_tolerance_days: i64,

    /// Maximum number of ranked alternatives per recommendation
    pub max_alternatives: usize,

    /// Completeness below this flags the result as insufficiently backed
    pub min_completeness: f64,

    /// How many recent daily climate records feed the feature vector
    pub climate_window_days: i64,

    /// Concurrent parcels processed within one bulk request
    pub bulk_concurrency: usize,

    /// Whether a cache hit still appends a history record
    pub persist_on_cache_hit: bool,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("APR_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("model.name", "modelo_siembra")?
            .set_default("model.timeout_seconds", 10)?
            .set_default("recommendation.window_tolerance_days", 5)?
            .set_default("recommendation.max_alternatives", 3)?
            .set_default("recommendation.min_completeness", 0.5)?
            .set_default("recommendation.climate_window_days", 10)?
            .set_default("recommendation.bulk_concurrency", 4)?
            .set_default("recommendation.persist_on_cache_hit", false)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (APR_ prefix)
            .add_source(
                Environment::with_prefix("APR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            window_tolerance_days: 5,
            max_alternatives: 3,
            min_completeness: 0.5,
            climate_window_days: 10,
            bulk_concurrency: 4,
            persist_on_cache_hit: false,
        }
    }
}
