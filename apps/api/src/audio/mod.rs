//! Recording persistence: the raw audio behind each entry, keyed by entry key.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use crate::errors::AppError;
use crate::journal::entry_key::EntryKey;

pub mod handlers;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAudio {
    pub bytes: Bytes,
    pub content_type: String,
}

#[async_trait]
pub trait AudioStore: Send + Sync {
    async fn persist(&self, key: &EntryKey, audio: StoredAudio) -> Result<(), AppError>;

    async fn exists(&self, key: &EntryKey) -> Result<bool, AppError>;

    async fn load(&self, key: &EntryKey) -> Result<Option<StoredAudio>, AppError>;

    async fn delete(&self, key: &EntryKey) -> Result<(), AppError>;
}

/// Recordings as S3 objects under `recordings/`.
#[derive(Clone)]
pub struct S3AudioStore {
    s3: aws_sdk_s3::Client,
    bucket: String,
}

impl S3AudioStore {
    pub fn new(s3: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { s3, bucket }
    }
}

fn object_key(key: &EntryKey) -> String {
    format!("recordings/{key}")
}

#[async_trait]
impl AudioStore for S3AudioStore {
    async fn persist(&self, key: &EntryKey, audio: StoredAudio) -> Result<(), AppError> {
        let object = object_key(key);
        let size = audio.bytes.len();
        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(&object)
            .body(ByteStream::from(audio.bytes))
            .content_type(audio.content_type)
            .send()
            .await
            .map_err(|e| AppError::S3(format!("upload of {object} failed: {e}")))?;

        info!("Uploaded recording ({size} bytes) to s3://{}/{}", self.bucket, object);
        Ok(())
    }

    async fn exists(&self, key: &EntryKey) -> Result<bool, AppError> {
        match self
            .s3
            .head_object()
            .bucket(&self.bucket)
            .key(object_key(key))
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(AppError::S3(format!("head of {} failed: {e}", object_key(key)))),
        }
    }

    async fn load(&self, key: &EntryKey) -> Result<Option<StoredAudio>, AppError> {
        let object = object_key(key);
        let output = match self
            .s3
            .get_object()
            .bucket(&self.bucket)
            .key(&object)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                return Ok(None)
            }
            Err(e) => return Err(AppError::S3(format!("download of {object} failed: {e}"))),
        };

        let content_type = output
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| AppError::S3(format!("reading {object} failed: {e}")))?
            .into_bytes();

        Ok(Some(StoredAudio {
            bytes,
            content_type,
        }))
    }

    async fn delete(&self, key: &EntryKey) -> Result<(), AppError> {
        let object = object_key(key);
        self.s3
            .delete_object()
            .bucket(&self.bucket)
            .key(&object)
            .send()
            .await
            .map_err(|e| AppError::S3(format!("delete of {object} failed: {e}")))?;
        Ok(())
    }
}

/// In-process recordings for local development and tests.
#[derive(Default)]
pub struct MemoryAudioStore {
    recordings: RwLock<HashMap<EntryKey, StoredAudio>>,
}

impl MemoryAudioStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AudioStore for MemoryAudioStore {
    async fn persist(&self, key: &EntryKey, audio: StoredAudio) -> Result<(), AppError> {
        self.recordings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), audio);
        Ok(())
    }

    async fn exists(&self, key: &EntryKey) -> Result<bool, AppError> {
        Ok(self
            .recordings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key))
    }

    async fn load(&self, key: &EntryKey) -> Result<Option<StoredAudio>, AppError> {
        Ok(self
            .recordings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    async fn delete(&self, key: &EntryKey) -> Result<(), AppError> {
        self.recordings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_layout() {
        let key = EntryKey::parse("06-01-24_09:00:00AM").unwrap();
        assert_eq!(object_key(&key), "recordings/06-01-24_09:00:00AM");
    }

    #[tokio::test]
    async fn test_memory_store_lifecycle() {
        let store = MemoryAudioStore::new();
        let key = EntryKey::parse("06-01-24_09:00:00AM").unwrap();
        assert!(!store.exists(&key).await.unwrap());
        assert!(store.load(&key).await.unwrap().is_none());

        let audio = StoredAudio {
            bytes: Bytes::from_static(b"OggS"),
            content_type: "audio/ogg".to_string(),
        };
        store.persist(&key, audio.clone()).await.unwrap();
        assert!(store.exists(&key).await.unwrap());
        assert_eq!(store.load(&key).await.unwrap(), Some(audio));

        store.delete(&key).await.unwrap();
        assert!(!store.exists(&key).await.unwrap());
    }
}
