use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{FromRow, PgPool};

use super::{EntryStorage, EntryWithContent};
use crate::errors::AppError;
use crate::journal::entry_key::EntryKey;

#[derive(Debug, FromRow)]
struct EntryRow {
    entry_key: String,
    content: String,
}

impl TryFrom<EntryRow> for EntryWithContent {
    type Error = AppError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        Ok(EntryWithContent {
            entry_key: EntryKey::parse(&row.entry_key)?,
            content: row.content,
        })
    }
}

/// Entries in the `journal_entries` table.
///
/// `recorded_at` mirrors the key's timestamp so ordering and range queries
/// never depend on the key's string collation.
#[derive(Clone)]
pub struct PgEntryStorage {
    pool: PgPool,
}

impl PgEntryStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntryStorage for PgEntryStorage {
    async fn all_keys(&self) -> Result<Vec<EntryKey>, AppError> {
        let raw: Vec<String> = sqlx::query_scalar(
            "SELECT entry_key FROM journal_entries ORDER BY recorded_at DESC, entry_key DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        raw.iter()
            .map(|k| EntryKey::parse(k).map_err(AppError::from))
            .collect()
    }

    async fn save(&self, key: &EntryKey, content: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO journal_entries (entry_key, content, recorded_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (entry_key) DO UPDATE SET content = EXCLUDED.content
            "#,
        )
        .bind(key.as_str())
        .bind(content)
        .bind(key.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load(&self, key: &EntryKey) -> Result<Option<String>, AppError> {
        Ok(
            sqlx::query_scalar("SELECT content FROM journal_entries WHERE entry_key = $1")
                .bind(key.as_str())
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn delete(&self, key: &EntryKey) -> Result<(), AppError> {
        sqlx::query("DELETE FROM journal_entries WHERE entry_key = $1")
            .bind(key.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM journal_entries")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn in_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<EntryWithContent>, AppError> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT entry_key, content
            FROM journal_entries
            WHERE recorded_at BETWEEN $1 AND $2
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(EntryWithContent::try_from).collect()
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
