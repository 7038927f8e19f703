//! HTTP handlers

pub mod health;
pub mod recommendation;

pub use health::*;
pub use recommendation::*;
