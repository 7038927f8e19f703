//! Cache mediator for computed recommendations
//!
//! The fingerprint is a pure function of (parcel, crop, campaign, request
//! day), so identical requests within a calendar day share one computation.
//! Entries expire at the end of the current day: the next day's request is
//! always recomputed against updated climate data.

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use sha2::{Digest, Sha256};
use shared::{Campaign, Crop, RecommendationResponse};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppResult;

/// A cached recommendation with its expiry
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub payload: RecommendationResponse,
    pub expires_at: DateTime<Utc>,
}

/// Key/value store for recommendation payloads.
///
/// Implementations must be safe for concurrent use. A store failure is
/// never fatal to the pipeline: the mediating caller degrades to
/// recomputation.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, fingerprint: &str) -> AppResult<Option<CacheEntry>>;
    async fn put(&self, entry: CacheEntry) -> AppResult<()>;
}

/// Deterministic cache key for one recommendation request.
///
/// The as-of date is already day-granular, which is what makes two
/// independent requests within the same day collide on purpose.
pub fn fingerprint(parcel_id: Uuid, crop: Crop, campaign: &Campaign, as_of: NaiveDate) -> String {
    let mut hasher = Sha256::new();
    hasher.update(parcel_id.as_bytes());
    hasher.update(crop.as_str().as_bytes());
    hasher.update(campaign.as_str().as_bytes());
    hasher.update(as_of.to_string().as_bytes());
    let digest = hasher.finalize();

    let mut hex = String::with_capacity(12 + digest.len() * 2);
    hex.push_str("rec:siembra:");
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(hex, "{:02x}", byte);
    }
    hex
}

/// Expiry for entries created at `now`: midnight UTC of the next day
pub fn end_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    let next_midnight = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .unwrap_or(now.date_naive())
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default();
    next_midnight.and_utc()
}

/// In-process cache store backed by a RwLock'd map.
///
/// Suitable for a single-instance deployment; the trait boundary is where a
/// shared external store would plug in.
#[derive(Default)]
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, fingerprint: &str) -> AppResult<Option<CacheEntry>> {
        let now = Utc::now();
        {
            let entries = self.entries.read().await;
            match entries.get(fingerprint) {
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // Lazily drop the expired entry.
        let mut entries = self.entries.write().await;
        if entries
            .get(fingerprint)
            .map(|e| e.expires_at <= now)
            .unwrap_or(false)
        {
            entries.remove(fingerprint);
        }
        Ok(None)
    }

    async fn put(&self, entry: CacheEntry) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(entry.fingerprint.clone(), entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fingerprint_is_deterministic() {
        let parcel = Uuid::from_u128(7);
        let campaign = Campaign::parse("2025/2026").unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 9, 14).unwrap();

        let a = fingerprint(parcel, Crop::Maiz, &campaign, day);
        let b = fingerprint(parcel, Crop::Maiz, &campaign, day);
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_varies_with_every_input() {
        let parcel = Uuid::from_u128(7);
        let campaign = Campaign::parse("2025/2026").unwrap();
        let other_campaign = Campaign::parse("2026/2027").unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 9, 14).unwrap();
        let next_day = NaiveDate::from_ymd_opt(2025, 9, 15).unwrap();

        let base = fingerprint(parcel, Crop::Maiz, &campaign, day);
        assert_ne!(base, fingerprint(Uuid::from_u128(8), Crop::Maiz, &campaign, day));
        assert_ne!(base, fingerprint(parcel, Crop::Soja, &campaign, day));
        assert_ne!(base, fingerprint(parcel, Crop::Maiz, &other_campaign, day));
        assert_ne!(base, fingerprint(parcel, Crop::Maiz, &campaign, next_day));
    }

    #[test]
    fn end_of_day_is_next_midnight() {
        let now = Utc.with_ymd_and_hms(2025, 9, 14, 16, 45, 0).unwrap();
        let expiry = end_of_day(now);
        assert_eq!(expiry, Utc.with_ymd_and_hms(2025, 9, 15, 0, 0, 0).unwrap());
        assert!(expiry > now);
    }
}
