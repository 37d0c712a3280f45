use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::errors::AppError;
use crate::insights::models::{Feedback, InsightsResult, StoredInsight};
use crate::journal::storage::EntryWithContent;

/// Persistence for generated insights. History is kept; callers only ever
/// surface the latest one.
#[async_trait]
pub trait InsightRepository: Send + Sync {
    async fn save(
        &self,
        snapshot: &[EntryWithContent],
        result: &InsightsResult,
    ) -> Result<StoredInsight, AppError>;

    async fn latest(&self) -> Result<Option<StoredInsight>, AppError>;

    async fn update_feedback(&self, id: i64, feedback: Feedback) -> Result<(), AppError>;
}

#[derive(Debug, FromRow)]
struct InsightRow {
    id: i64,
    entries_snapshot: Json<Vec<EntryWithContent>>,
    entry_count: i32,
    result: Json<InsightsResult>,
    feedback: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<InsightRow> for StoredInsight {
    type Error = AppError;

    fn try_from(row: InsightRow) -> Result<Self, Self::Error> {
        let feedback = row
            .feedback
            .as_deref()
            .map(str::parse::<Feedback>)
            .transpose()
            .map_err(|e| anyhow!("insight {}: {e}", row.id))?;
        Ok(StoredInsight {
            id: row.id,
            entries_snapshot: row.entries_snapshot.0,
            entry_count: usize::try_from(row.entry_count)
                .with_context(|| format!("insight {} has a negative entry_count", row.id))?,
            result: row.result.0,
            feedback,
            created_at: row.created_at,
        })
    }
}

/// Insights in the `insights` table; snapshot and result are JSONB.
#[derive(Clone)]
pub struct PgInsightRepository {
    pool: PgPool,
}

impl PgInsightRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InsightRepository for PgInsightRepository {
    async fn save(
        &self,
        snapshot: &[EntryWithContent],
        result: &InsightsResult,
    ) -> Result<StoredInsight, AppError> {
        let entry_count =
            i32::try_from(snapshot.len()).context("insight snapshot too large to store")?;

        let row = sqlx::query_as::<_, InsightRow>(
            r#"
            INSERT INTO insights (entries_snapshot, entry_count, result)
            VALUES ($1, $2, $3)
            RETURNING id, entries_snapshot, entry_count, result, feedback, created_at
            "#,
        )
        .bind(Json(snapshot))
        .bind(entry_count)
        .bind(Json(result))
        .fetch_one(&self.pool)
        .await?;

        info!("Stored insight {} over {entry_count} entries", row.id);
        row.try_into()
    }

    async fn latest(&self) -> Result<Option<StoredInsight>, AppError> {
        sqlx::query_as::<_, InsightRow>(
            r#"
            SELECT id, entries_snapshot, entry_count, result, feedback, created_at
            FROM insights
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?
        .map(StoredInsight::try_from)
        .transpose()
    }

    async fn update_feedback(&self, id: i64, feedback: Feedback) -> Result<(), AppError> {
        let updated = sqlx::query("UPDATE insights SET feedback = $1 WHERE id = $2")
            .bind(feedback.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if updated == 0 {
            return Err(AppError::NotFound(format!("Insight {id} not found")));
        }
        Ok(())
    }
}
