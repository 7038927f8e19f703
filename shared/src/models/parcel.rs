//! Parcel (lote) input data models
//!
//! A `ParcelContext` is the transient bundle of everything known about a
//! parcel at the moment a recommendation is computed: soil, recent climate,
//! yield history, plus a completeness score describing how much of the
//! expected input data was actually available.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::types::{Campaign, Crop, GpsCoordinates};

/// Most recent soil analysis for a parcel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoilSample {
    pub organic_matter_pct: Decimal,
    pub ph: Decimal,
    pub texture: String,
    pub sampled_on: NaiveDate,
}

/// One daily climate record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimateRecord {
    pub date: NaiveDate,
    pub temp_max_celsius: Decimal,
    pub temp_min_celsius: Decimal,
    pub precipitation_mm: Decimal,
    pub humidity_percent: Option<Decimal>,
    pub wind_speed_kmh: Option<Decimal>,
    pub solar_radiation_mj_m2: Option<Decimal>,
}

/// Historical yield for one campaign year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YieldRecord {
    pub year: i32,
    pub yield_kg_ha: Decimal,
}

/// Everything known about a parcel for one recommendation request.
///
/// Owned by a single request; never cached or persisted as-is (a JSON
/// snapshot of it travels with the history record instead).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParcelContext {
    pub parcel_id: Uuid,
    pub coordinates: GpsCoordinates,
    pub crop: Crop,
    pub campaign: Campaign,
    pub as_of: NaiveDate,
    pub soil: Option<SoilSample>,
    /// Most recent daily records as of the query date, newest last.
    pub climate_window: Vec<ClimateRecord>,
    /// Year -> kg/ha. BTreeMap keeps snapshots byte-stable across runs.
    pub historical_yields: BTreeMap<i32, Decimal>,
    /// How much of the expected input data was available, in [0, 1].
    pub completeness: f64,
}

impl ParcelContext {
    /// Average precipitation over the climate window, if any records exist.
    pub fn mean_precipitation_mm(&self) -> Option<Decimal> {
        if self.climate_window.is_empty() {
            return None;
        }
        let sum: Decimal = self
            .climate_window
            .iter()
            .map(|r| r.precipitation_mm)
            .sum();
        Some(sum / Decimal::from(self.climate_window.len() as i64))
    }

    /// Average of daily mean temperatures over the climate window.
    pub fn mean_temperature_celsius(&self) -> Option<Decimal> {
        if self.climate_window.is_empty() {
            return None;
        }
        let two = Decimal::from(2);
        let sum: Decimal = self
            .climate_window
            .iter()
            .map(|r| (r.temp_max_celsius + r.temp_min_celsius) / two)
            .sum();
        Some(sum / Decimal::from(self.climate_window.len() as i64))
    }
}

/// Timestamped snapshot of the inputs a recommendation was computed from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub captured_at: DateTime<Utc>,
    pub parcel_id: Uuid,
    pub crop: Crop,
    pub campaign: Campaign,
    pub as_of: NaiveDate,
    pub soil: Option<SoilSample>,
    pub climate_days: usize,
    pub yield_years: usize,
    pub completeness: f64,
}

impl InputSnapshot {
    pub fn from_context(ctx: &ParcelContext, captured_at: DateTime<Utc>) -> Self {
        Self {
            captured_at,
            parcel_id: ctx.parcel_id,
            crop: ctx.crop,
            campaign: ctx.campaign.clone(),
            as_of: ctx.as_of,
            soil: ctx.soil.clone(),
            climate_days: ctx.climate_window.len(),
            yield_years: ctx.historical_yields.len(),
            completeness: ctx.completeness,
        }
    }
}
