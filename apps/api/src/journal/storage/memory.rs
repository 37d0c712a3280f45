use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::{EntryStorage, EntryWithContent};
use crate::errors::AppError;
use crate::journal::entry_key::EntryKey;

/// In-process entry store. Nothing survives a restart; used for local
/// development (`ENTRY_STORE=memory`) and as the fake in tests.
#[derive(Default)]
pub struct MemoryEntryStorage {
    entries: RwLock<BTreeMap<EntryKey, String>>,
}

impl MemoryEntryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntryStorage for MemoryEntryStorage {
    async fn all_keys(&self) -> Result<Vec<EntryKey>, AppError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.keys().rev().cloned().collect())
    }

    async fn save(&self, key: &EntryKey, content: &str) -> Result<(), AppError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), content.to_string());
        Ok(())
    }

    async fn load(&self, key: &EntryKey) -> Result<Option<String>, AppError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    async fn delete(&self, key: &EntryKey) -> Result<(), AppError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), AppError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }

    async fn in_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<EntryWithContent>, AppError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .iter()
            .filter(|(key, _)| (start..=end).contains(&key.timestamp()))
            .map(|(key, content)| EntryWithContent {
                entry_key: key.clone(),
                content: content.clone(),
            })
            .collect())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
