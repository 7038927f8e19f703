//! Business logic services for the Planting Recommendation Platform

pub mod aggregator;
pub mod builder;
pub mod cache;
pub mod history;
pub mod recommendation;
pub mod scoring;

pub use aggregator::{ContextSource, PgFeatureAggregator};
pub use builder::RecommendationBuilder;
pub use cache::{CacheStore, InMemoryCacheStore};
pub use history::{HistoryStore, PgHistoryRepository};
pub use recommendation::RecommendationService;
pub use scoring::PredictionModel;
