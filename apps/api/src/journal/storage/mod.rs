//! Entry storage: one trait, several backends selected at startup.
//!
//! `AppState` holds an `Arc<dyn EntryStorage>`; the backend is picked from
//! `ENTRY_STORE` in `main` and nothing else branches on it.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::journal::entry_key::EntryKey;

mod memory;
mod postgres;
mod redis_kv;

pub use self::memory::MemoryEntryStorage;
pub use self::postgres::PgEntryStorage;
pub use self::redis_kv::RedisEntryStorage;

/// An entry together with its transcript text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryWithContent {
    pub entry_key: EntryKey,
    pub content: String,
}

#[async_trait]
pub trait EntryStorage: Send + Sync {
    /// Every stored key, newest first.
    async fn all_keys(&self) -> Result<Vec<EntryKey>, AppError>;

    /// Upserts the content stored under `key`.
    async fn save(&self, key: &EntryKey, content: &str) -> Result<(), AppError>;

    async fn load(&self, key: &EntryKey) -> Result<Option<String>, AppError>;

    async fn delete(&self, key: &EntryKey) -> Result<(), AppError>;

    async fn delete_all(&self) -> Result<(), AppError>;

    /// Entries whose timestamp falls in `[start, end]`, oldest first.
    async fn in_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<EntryWithContent>, AppError>;

    /// Backend name for logs.
    fn backend(&self) -> &'static str;
}

/// Saves a new entry under a freshly generated key and returns the key.
///
/// With `date` set the entry is backfilled onto that day at the current
/// time-of-day; an existing entry on that day is left alone. A date whose
/// year a key cannot hold is a validation error.
pub async fn record_entry(
    storage: &dyn EntryStorage,
    content: &str,
    date: Option<NaiveDate>,
) -> Result<EntryKey, AppError> {
    let key = match date {
        Some(date) => {
            EntryKey::with_date(date).map_err(|e| AppError::Validation(e.to_string()))?
        }
        None => EntryKey::now()?,
    };
    storage.save(&key, content).await?;
    info!("Saved entry {key} ({} backend)", storage.backend());
    Ok(key)
}
