//! Feature aggregator: collects soil, climate, and yield data for a parcel
//!
//! Read-only. Produces a `ParcelContext` with a completeness score; partial
//! data degrades the score instead of failing, and only a parcel with
//! neither soil nor climate data is rejected as `DataUnavailable`.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use shared::{Campaign, ClimateRecord, Crop, GpsCoordinates, ParcelContext, SoilSample};

use crate::error::{AppError, AppResult};

/// Weights of each input family in the completeness score
const SOIL_WEIGHT: f64 = 0.4;
const CLIMATE_WEIGHT: f64 = 0.4;
const YIELD_WEIGHT: f64 = 0.2;

/// Yield history saturates the score at this many campaigns
const YIELD_SATURATION_YEARS: usize = 3;

/// Source of aggregated parcel contexts
#[async_trait]
pub trait ContextSource: Send + Sync {
    async fn load(
        &self,
        parcel_id: Uuid,
        crop: Crop,
        campaign: &Campaign,
        as_of: NaiveDate,
    ) -> AppResult<ParcelContext>;
}

/// Postgres-backed feature aggregator
#[derive(Clone)]
pub struct PgFeatureAggregator {
    db: PgPool,
    climate_window_days: i64,
}

#[derive(sqlx::FromRow)]
struct ParcelRow {
    latitude: Decimal,
    longitude: Decimal,
}

#[derive(sqlx::FromRow)]
struct SoilRow {
    organic_matter_pct: Decimal,
    ph: Decimal,
    texture: String,
    sampled_on: NaiveDate,
}

#[derive(sqlx::FromRow)]
struct ClimateRow {
    date: NaiveDate,
    temp_max_celsius: Decimal,
    temp_min_celsius: Decimal,
    precipitation_mm: Decimal,
    humidity_percent: Option<Decimal>,
    wind_speed_kmh: Option<Decimal>,
    solar_radiation_mj_m2: Option<Decimal>,
}

#[derive(sqlx::FromRow)]
struct YieldRow {
    year: i32,
    yield_kg_ha: Decimal,
}

impl PgFeatureAggregator {
    pub fn new(db: PgPool, climate_window_days: i64) -> Self {
        Self {
            db,
            climate_window_days,
        }
    }

    async fn latest_soil_sample(
        &self,
        parcel_id: Uuid,
        as_of: NaiveDate,
    ) -> AppResult<Option<SoilSample>> {
        let row = sqlx::query_as::<_, SoilRow>(
            r#"
            SELECT organic_matter_pct, ph, texture, sampled_on
            FROM soil_samples
            WHERE parcel_id = $1 AND sampled_on <= $2
            ORDER BY sampled_on DESC
            LIMIT 1
            "#,
        )
        .bind(parcel_id)
        .bind(as_of)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|r| SoilSample {
            organic_matter_pct: r.organic_matter_pct,
            ph: r.ph,
            texture: r.texture,
            sampled_on: r.sampled_on,
        }))
    }

    async fn recent_climate(
        &self,
        parcel_id: Uuid,
        as_of: NaiveDate,
    ) -> AppResult<Vec<ClimateRecord>> {
        let rows = sqlx::query_as::<_, ClimateRow>(
            r#"
            SELECT date, temp_max_celsius, temp_min_celsius, precipitation_mm,
                   humidity_percent, wind_speed_kmh, solar_radiation_mj_m2
            FROM climate_records
            WHERE parcel_id = $1 AND date <= $2
            ORDER BY date DESC
            LIMIT $3
            "#,
        )
        .bind(parcel_id)
        .bind(as_of)
        .bind(self.climate_window_days)
        .fetch_all(&self.db)
        .await?;

        let mut records: Vec<ClimateRecord> = rows
            .into_iter()
            .map(|r| ClimateRecord {
                date: r.date,
                temp_max_celsius: r.temp_max_celsius,
                temp_min_celsius: r.temp_min_celsius,
                precipitation_mm: r.precipitation_mm,
                humidity_percent: r.humidity_percent,
                wind_speed_kmh: r.wind_speed_kmh,
                solar_radiation_mj_m2: r.solar_radiation_mj_m2,
            })
            .collect();

        // Query returns newest-first; the context keeps chronological order.
        records.reverse();
        Ok(records)
    }

    async fn yield_history(
        &self,
        parcel_id: Uuid,
        crop: Crop,
    ) -> AppResult<BTreeMap<i32, Decimal>> {
        let rows = sqlx::query_as::<_, YieldRow>(
            r#"
            SELECT year, yield_kg_ha
            FROM yield_history
            WHERE parcel_id = $1 AND crop = $2
            ORDER BY year DESC
            "#,
        )
        .bind(parcel_id)
        .bind(crop.as_str())
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| (r.year, r.yield_kg_ha)).collect())
    }
}

/// Completeness in [0, 1] from soil presence, climate-window fill fraction,
/// and yield-history depth.
pub fn completeness_score(
    has_soil: bool,
    climate_days: usize,
    expected_climate_days: usize,
    yield_years: usize,
) -> f64 {
    let soil = if has_soil { 1.0 } else { 0.0 };
    let climate = if expected_climate_days == 0 {
        0.0
    } else {
        (climate_days as f64 / expected_climate_days as f64).min(1.0)
    };
    let yields = (yield_years.min(YIELD_SATURATION_YEARS) as f64) / YIELD_SATURATION_YEARS as f64;

    (SOIL_WEIGHT * soil + CLIMATE_WEIGHT * climate + YIELD_WEIGHT * yields).clamp(0.0, 1.0)
}

#[async_trait]
impl ContextSource for PgFeatureAggregator {
    async fn load(
        &self,
        parcel_id: Uuid,
        crop: Crop,
        campaign: &Campaign,
        as_of: NaiveDate,
    ) -> AppResult<ParcelContext> {
        let parcel = sqlx::query_as::<_, ParcelRow>(
            "SELECT latitude, longitude FROM parcels WHERE id = $1",
        )
        .bind(parcel_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::DataUnavailable(format!("parcel {} is unknown", parcel_id)))?;

        let soil = self.latest_soil_sample(parcel_id, as_of).await?;
        let climate_window = self.recent_climate(parcel_id, as_of).await?;
        let historical_yields = self.yield_history(parcel_id, crop).await?;

        if soil.is_none() && climate_window.is_empty() {
            return Err(AppError::DataUnavailable(format!(
                "parcel {} has no soil nor climate data",
                parcel_id
            )));
        }

        let completeness = completeness_score(
            soil.is_some(),
            climate_window.len(),
            self.climate_window_days as usize,
            historical_yields.len(),
        );

        tracing::debug!(
            %parcel_id,
            crop = crop.as_str(),
            climate_days = climate_window.len(),
            yield_years = historical_yields.len(),
            completeness,
            "Aggregated parcel context"
        );

        Ok(ParcelContext {
            parcel_id,
            coordinates: GpsCoordinates::new(parcel.latitude, parcel.longitude),
            crop,
            campaign: campaign.clone(),
            as_of,
            soil,
            climate_window,
            historical_yields,
            completeness,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completeness_full_data_is_one() {
        let score = completeness_score(true, 10, 10, 3);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn completeness_degrades_with_missing_climate() {
        let full = completeness_score(true, 10, 10, 3);
        let partial = completeness_score(true, 2, 10, 3);
        assert!(partial < full);
        assert!(partial > 0.0);
    }

    #[test]
    fn completeness_without_any_data_is_zero() {
        assert_eq!(completeness_score(false, 0, 10, 0), 0.0);
    }

    #[test]
    fn yield_history_saturates() {
        let three = completeness_score(true, 10, 10, 3);
        let ten = completeness_score(true, 10, 10, 10);
        assert_eq!(three, ten);
    }
}
