use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::llm_client::DEFAULT_BASE_URL;

/// Where journal entries live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStoreKind {
    Postgres,
    Redis,
    Memory,
}

impl FromStr for EntryStoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(EntryStoreKind::Postgres),
            "redis" => Ok(EntryStoreKind::Redis),
            "memory" => Ok(EntryStoreKind::Memory),
            other => bail!("ENTRY_STORE must be postgres, redis or memory (got '{other}')"),
        }
    }
}

/// Where recordings live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStoreKind {
    S3,
    Memory,
}

impl FromStr for AudioStoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s3" => Ok(AudioStoreKind::S3),
            "memory" => Ok(AudioStoreKind::Memory),
            other => bail!("AUDIO_STORE must be s3 or memory (got '{other}')"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub entry_store: EntryStoreKind,
    /// Set only when `entry_store` is `Redis`.
    pub redis_url: Option<String>,
    pub audio_store: AudioStoreKind,
    /// Set only when `audio_store` is `S3`.
    pub s3: Option<S3Settings>,
    /// Absent is allowed: insights and transcription then report "not configured".
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let entry_store: EntryStoreKind = optional_env("ENTRY_STORE")
            .unwrap_or_else(|| "postgres".to_string())
            .parse()?;
        let audio_store: AudioStoreKind = optional_env("AUDIO_STORE")
            .unwrap_or_else(|| "s3".to_string())
            .parse()?;

        let redis_url = match entry_store {
            EntryStoreKind::Redis => Some(require_env("REDIS_URL")?),
            EntryStoreKind::Postgres | EntryStoreKind::Memory => None,
        };

        let s3 = match audio_store {
            AudioStoreKind::S3 => Some(S3Settings {
                bucket: require_env("S3_BUCKET")?,
                endpoint: require_env("S3_ENDPOINT")?,
                access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            }),
            AudioStoreKind::Memory => None,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            entry_store,
            redis_url,
            audio_store,
            s3,
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are the same thing.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_store_kind_parsing() {
        assert_eq!("postgres".parse::<EntryStoreKind>().unwrap(), EntryStoreKind::Postgres);
        assert_eq!(" Redis ".parse::<EntryStoreKind>().unwrap(), EntryStoreKind::Redis);
        assert_eq!("MEMORY".parse::<EntryStoreKind>().unwrap(), EntryStoreKind::Memory);
        assert!("sqlite".parse::<EntryStoreKind>().is_err());
    }

    #[test]
    fn test_audio_store_kind_parsing() {
        assert_eq!("s3".parse::<AudioStoreKind>().unwrap(), AudioStoreKind::S3);
        assert_eq!("memory".parse::<AudioStoreKind>().unwrap(), AudioStoreKind::Memory);
        let err = "disk".parse::<AudioStoreKind>().unwrap_err();
        assert!(err.to_string().contains("AUDIO_STORE"));
    }
}
