//! Shared types and models for the Planting Recommendation Platform
//!
//! This crate contains the domain types shared between the backend and any
//! other component of the system (batch tooling, exporters).

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
