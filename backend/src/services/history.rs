//! History repository: append-only persistence of generated recommendations
//!
//! Each cache-miss computation appends one immutable record. Queries filter
//! by intersection over client, parcel, crop, and campaign, newest first,
//! with a total count independent of the requested page.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use shared::{Crop, HistoryRecord, Page, Pagination};

use crate::error::{AppError, AppResult};

/// Optional AND-filters for history queries; `None` matches any
#[derive(Debug, Clone, Default)]
pub struct HistoryFilters {
    pub client_id: Option<Uuid>,
    pub parcel_id: Option<Uuid>,
    pub crop: Option<Crop>,
    pub campaign: Option<String>,
}

/// Durable system of record for generated recommendations
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append one record. Never updates in place.
    async fn append(&self, record: &HistoryRecord) -> AppResult<()>;

    /// Filtered, paginated query ordered by creation time descending.
    async fn query(
        &self,
        filters: &HistoryFilters,
        pagination: Pagination,
    ) -> AppResult<Page<HistoryRecord>>;
}

/// Postgres-backed history repository
#[derive(Clone)]
pub struct PgHistoryRepository {
    db: PgPool,
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: Uuid,
    parcel_id: Uuid,
    client_id: Uuid,
    crop: String,
    campaign: String,
    created_at: DateTime<Utc>,
    valid_from: Option<NaiveDate>,
    valid_until: Option<NaiveDate>,
    principal_window: serde_json::Value,
    alternatives: serde_json::Value,
    confidence: f64,
    input_snapshot: serde_json::Value,
    model_version: Option<String>,
}

impl TryFrom<HistoryRow> for HistoryRecord {
    type Error = AppError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        let crop: Crop = row
            .crop
            .parse()
            .map_err(|e: String| AppError::Internal(format!("corrupt history row: {}", e)))?;

        Ok(HistoryRecord {
            id: row.id,
            parcel_id: row.parcel_id,
            client_id: row.client_id,
            crop,
            campaign: row.campaign,
            created_at: row.created_at,
            valid_from: row.valid_from,
            valid_until: row.valid_until,
            principal_window: row.principal_window,
            alternatives: row.alternatives,
            confidence: row.confidence,
            input_snapshot: row.input_snapshot,
            model_version: row.model_version,
        })
    }
}

impl PgHistoryRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HistoryStore for PgHistoryRepository {
    async fn append(&self, record: &HistoryRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO recommendation_history
                (id, parcel_id, client_id, crop, campaign, created_at,
                 valid_from, valid_until, principal_window, alternatives,
                 confidence, input_snapshot, model_version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(record.id)
        .bind(record.parcel_id)
        .bind(record.client_id)
        .bind(record.crop.as_str())
        .bind(&record.campaign)
        .bind(record.created_at)
        .bind(record.valid_from)
        .bind(record.valid_until)
        .bind(&record.principal_window)
        .bind(&record.alternatives)
        .bind(record.confidence)
        .bind(&record.input_snapshot)
        .bind(&record.model_version)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn query(
        &self,
        filters: &HistoryFilters,
        pagination: Pagination,
    ) -> AppResult<Page<HistoryRecord>> {
        let pagination = pagination.clamped();
        let crop = filters.crop.map(|c| c.as_str().to_string());

        // Optional filters stay in static SQL: a NULL bind matches any row.
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM recommendation_history
            WHERE ($1::uuid IS NULL OR client_id = $1)
              AND ($2::uuid IS NULL OR parcel_id = $2)
              AND ($3::text IS NULL OR crop = $3)
              AND ($4::text IS NULL OR campaign = $4)
            "#,
        )
        .bind(filters.client_id)
        .bind(filters.parcel_id)
        .bind(&crop)
        .bind(&filters.campaign)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, parcel_id, client_id, crop, campaign, created_at,
                   valid_from, valid_until, principal_window, alternatives,
                   confidence, input_snapshot, model_version
            FROM recommendation_history
            WHERE ($1::uuid IS NULL OR client_id = $1)
              AND ($2::uuid IS NULL OR parcel_id = $2)
              AND ($3::text IS NULL OR crop = $3)
              AND ($4::text IS NULL OR campaign = $4)
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(filters.client_id)
        .bind(filters.parcel_id)
        .bind(&crop)
        .bind(&filters.campaign)
        .bind(pagination.limit as i64)
        .bind(pagination.offset as i64)
        .fetch_all(&self.db)
        .await?;

        let items = rows
            .into_iter()
            .map(HistoryRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page { total, items })
    }
}
