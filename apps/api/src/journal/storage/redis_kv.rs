use async_trait::async_trait;
use chrono::NaiveDateTime;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use super::{EntryStorage, EntryWithContent};
use crate::errors::AppError;
use crate::journal::entry_key::{sort_newest_first, EntryKey};

/// Namespace for journal entries in the key-value store.
pub const STORAGE_PREFIX: &str = "journal_";

/// Key-value entry store: one string value per `journal_<entry key>`.
///
/// Range queries and ordering parse the keys, since string order is not
/// chronological.
#[derive(Clone)]
pub struct RedisEntryStorage {
    client: redis::Client,
}

impl RedisEntryStorage {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    async fn connection(&self) -> Result<MultiplexedConnection, AppError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    async fn stored_names(&self, conn: &mut MultiplexedConnection) -> Result<Vec<String>, AppError> {
        Ok(conn.keys(format!("{STORAGE_PREFIX}*")).await?)
    }
}

fn storage_name(key: &EntryKey) -> String {
    format!("{STORAGE_PREFIX}{key}")
}

fn parse_storage_names(names: &[String]) -> Result<Vec<EntryKey>, AppError> {
    names
        .iter()
        .filter_map(|name| name.strip_prefix(STORAGE_PREFIX))
        .map(|raw| EntryKey::parse(raw).map_err(AppError::from))
        .collect()
}

#[async_trait]
impl EntryStorage for RedisEntryStorage {
    async fn all_keys(&self) -> Result<Vec<EntryKey>, AppError> {
        let mut conn = self.connection().await?;
        let names = self.stored_names(&mut conn).await?;
        let mut keys = parse_storage_names(&names)?;
        sort_newest_first(&mut keys);
        Ok(keys)
    }

    async fn save(&self, key: &EntryKey, content: &str) -> Result<(), AppError> {
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(storage_name(key), content).await?;
        Ok(())
    }

    async fn load(&self, key: &EntryKey) -> Result<Option<String>, AppError> {
        let mut conn = self.connection().await?;
        Ok(conn.get(storage_name(key)).await?)
    }

    async fn delete(&self, key: &EntryKey) -> Result<(), AppError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(storage_name(key)).await?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), AppError> {
        let mut conn = self.connection().await?;
        let names = self.stored_names(&mut conn).await?;
        if !names.is_empty() {
            conn.del::<_, ()>(names).await?;
        }
        Ok(())
    }

    async fn in_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<EntryWithContent>, AppError> {
        let mut conn = self.connection().await?;
        let names = self.stored_names(&mut conn).await?;
        let mut keys: Vec<EntryKey> = parse_storage_names(&names)?
            .into_iter()
            .filter(|k| (start..=end).contains(&k.timestamp()))
            .collect();
        keys.sort();

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            // A key deleted between KEYS and GET is skipped.
            let content: Option<String> = conn.get(storage_name(&key)).await?;
            if let Some(content) = content {
                entries.push(EntryWithContent {
                    entry_key: key,
                    content,
                });
            }
        }
        Ok(entries)
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_name_uses_prefix() {
        let key = EntryKey::parse("06-01-24_09:00:00AM").unwrap();
        assert_eq!(storage_name(&key), "journal_06-01-24_09:00:00AM");
    }

    #[test]
    fn test_parse_storage_names_skips_foreign_keys() {
        let names = vec![
            "journal_06-01-24_09:00:00AM".to_string(),
            "session:abc".to_string(),
        ];
        let keys = parse_storage_names(&names).unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].as_str(), "06-01-24_09:00:00AM");
    }

    #[test]
    fn test_parse_storage_names_rejects_corrupt_entry() {
        let names = vec!["journal_garbage".to_string()];
        assert!(matches!(
            parse_storage_names(&names),
            Err(AppError::EntryKey(_))
        ));
    }
}
