use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS journal_entries (
        entry_key   TEXT PRIMARY KEY,
        content     TEXT NOT NULL,
        recorded_at TIMESTAMP NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS journal_entries_recorded_at_idx ON journal_entries (recorded_at)",
    r#"
    CREATE TABLE IF NOT EXISTS insights (
        id               BIGSERIAL PRIMARY KEY,
        entries_snapshot JSONB NOT NULL,
        entry_count      INTEGER NOT NULL,
        result           JSONB NOT NULL,
        feedback         TEXT CHECK (feedback IN ('positive', 'neutral', 'negative')),
        created_at       TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the journal tables if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to apply schema statement: {}", statement.trim()))?;
    }
    info!("Database schema ready");
    Ok(())
}
