//! Domain models for the Planting Recommendation Platform

mod parcel;
mod recommendation;

pub use parcel::*;
pub use recommendation::*;
