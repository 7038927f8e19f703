//! Clients for external collaborators

pub mod model_client;

pub use model_client::HttpModelClient;
