//! Test doubles and fixtures shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use apr_backend::error::{AppError, AppResult};
use apr_backend::services::aggregator::{completeness_score, ContextSource};
use apr_backend::services::cache::{CacheEntry, CacheStore};
use apr_backend::services::history::{HistoryFilters, HistoryStore};
use apr_backend::services::scoring::{FeatureVector, PredictionModel, RawPrediction};
use shared::{
    Campaign, ClimateRecord, Crop, GpsCoordinates, HistoryRecord, Page, Pagination, ParcelContext,
    SoilSample,
};

pub const CLIMATE_WINDOW_DAYS: usize = 10;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn dec(v: i64) -> Decimal {
    Decimal::from(v)
}

/// Build a parcel context with a controllable amount of available data.
pub fn test_context(
    parcel_id: Uuid,
    crop: Crop,
    campaign: &Campaign,
    as_of: NaiveDate,
    climate_days: usize,
    has_soil: bool,
    yield_years: usize,
) -> ParcelContext {
    let soil = has_soil.then(|| SoilSample {
        organic_matter_pct: Decimal::new(32, 1),
        ph: Decimal::new(64, 1),
        texture: "franco".to_string(),
        sampled_on: date(2025, 3, 10),
    });

    let climate_window = (0..climate_days)
        .map(|i| ClimateRecord {
            date: as_of - chrono::Days::new((climate_days - i) as u64),
            temp_max_celsius: dec(24),
            temp_min_celsius: dec(12),
            precipitation_mm: dec(3),
            humidity_percent: Some(dec(60)),
            wind_speed_kmh: Some(dec(14)),
            solar_radiation_mj_m2: None,
        })
        .collect();

    let historical_yields: BTreeMap<i32, Decimal> = (0..yield_years)
        .map(|i| (2024 - i as i32, dec(8200)))
        .collect();

    ParcelContext {
        parcel_id,
        coordinates: GpsCoordinates::new(Decimal::new(-34_6, 1), Decimal::new(-60_9, 1)),
        crop,
        campaign: campaign.clone(),
        as_of,
        soil,
        climate_window,
        historical_yields,
        completeness: completeness_score(has_soil, climate_days, CLIMATE_WINDOW_DAYS, yield_years),
    }
}

/// Context source double: full data unless a parcel is listed as sparse or
/// missing entirely.
pub struct StubContextSource {
    pub missing: HashSet<Uuid>,
    /// parcel id -> (climate_days, has_soil, yield_years)
    pub sparse: std::collections::HashMap<Uuid, (usize, bool, usize)>,
}

impl StubContextSource {
    pub fn full() -> Self {
        Self {
            missing: HashSet::new(),
            sparse: std::collections::HashMap::new(),
        }
    }

    pub fn with_missing(parcels: &[Uuid]) -> Self {
        Self {
            missing: parcels.iter().copied().collect(),
            sparse: std::collections::HashMap::new(),
        }
    }
}

#[async_trait]
impl ContextSource for StubContextSource {
    async fn load(
        &self,
        parcel_id: Uuid,
        crop: Crop,
        campaign: &Campaign,
        as_of: NaiveDate,
    ) -> AppResult<ParcelContext> {
        if self.missing.contains(&parcel_id) {
            return Err(AppError::DataUnavailable(format!(
                "parcel {} has no soil nor climate data",
                parcel_id
            )));
        }
        let (climate_days, has_soil, yield_years) = self
            .sparse
            .get(&parcel_id)
            .copied()
            .unwrap_or((CLIMATE_WINDOW_DAYS, true, 3));
        Ok(test_context(
            parcel_id,
            crop,
            campaign,
            as_of,
            climate_days,
            has_soil,
            yield_years,
        ))
    }
}

/// Deterministic model double
pub struct StubModel {
    pub day_of_year: u32,
    pub confidence: f64,
    pub calls: AtomicUsize,
}

impl StubModel {
    pub fn new(day_of_year: u32, confidence: f64) -> Self {
        Self {
            day_of_year,
            confidence,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PredictionModel for StubModel {
    async fn predict(&self, _features: &FeatureVector) -> AppResult<RawPrediction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RawPrediction {
            optimal_day_of_year: self.day_of_year,
            model_confidence: self.confidence,
            indicators: BTreeMap::new(),
            model_version: "v1-test".to_string(),
        })
    }
}

/// Model double that is never reachable
pub struct UnavailableModel;

#[async_trait]
impl PredictionModel for UnavailableModel {
    async fn predict(&self, _features: &FeatureVector) -> AppResult<RawPrediction> {
        Err(AppError::ModelUnavailable("model not loaded".to_string()))
    }
}

/// History store double recording every append
#[derive(Default)]
pub struct RecordingHistoryStore {
    pub appended: Mutex<Vec<HistoryRecord>>,
}

#[async_trait]
impl HistoryStore for RecordingHistoryStore {
    async fn append(&self, record: &HistoryRecord) -> AppResult<()> {
        self.appended.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn query(
        &self,
        filters: &HistoryFilters,
        pagination: Pagination,
    ) -> AppResult<Page<HistoryRecord>> {
        let appended = self.appended.lock().unwrap();
        let mut matching: Vec<HistoryRecord> = appended
            .iter()
            .filter(|r| {
                filters.client_id.map_or(true, |c| r.client_id == c)
                    && filters.parcel_id.map_or(true, |p| r.parcel_id == p)
                    && filters.crop.map_or(true, |c| r.crop == c)
                    && filters
                        .campaign
                        .as_ref()
                        .map_or(true, |c| &r.campaign == c)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .collect();
        Ok(Page { total, items })
    }
}

/// History store double that always fails
pub struct FailingHistoryStore;

#[async_trait]
impl HistoryStore for FailingHistoryStore {
    async fn append(&self, _record: &HistoryRecord) -> AppResult<()> {
        Err(AppError::StorageError("history store unreachable".to_string()))
    }

    async fn query(
        &self,
        _filters: &HistoryFilters,
        _pagination: Pagination,
    ) -> AppResult<Page<HistoryRecord>> {
        Err(AppError::StorageError("history store unreachable".to_string()))
    }
}

/// Cache store double that always fails
pub struct FailingCacheStore;

#[async_trait]
impl CacheStore for FailingCacheStore {
    async fn get(&self, _fingerprint: &str) -> AppResult<Option<CacheEntry>> {
        Err(AppError::StorageError("cache unreachable".to_string()))
    }

    async fn put(&self, _entry: CacheEntry) -> AppResult<()> {
        Err(AppError::StorageError("cache unreachable".to_string()))
    }
}
