mod audio;
mod config;
mod db;
mod errors;
mod insights;
mod journal;
mod llm_client;
mod routes;
mod state;
mod transcription;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::audio::{AudioStore, MemoryAudioStore, S3AudioStore};
use crate::config::{AudioStoreKind, Config, EntryStoreKind, S3Settings};
use crate::db::{create_pool, ensure_schema};
use crate::insights::manager::InsightManager;
use crate::insights::repository::PgInsightRepository;
use crate::insights::summarizer::LlmSummarizer;
use crate::journal::storage::{
    EntryStorage, MemoryEntryStorage, PgEntryStorage, RedisEntryStorage,
};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::transcription::WhisperTranscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Voice Journal API v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL always backs insights, and entries by default
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    let entries: Arc<dyn EntryStorage> = match config.entry_store {
        EntryStoreKind::Postgres => Arc::new(PgEntryStorage::new(db.clone())),
        EntryStoreKind::Redis => {
            let url = config
                .redis_url
                .clone()
                .context("REDIS_URL is required when ENTRY_STORE=redis")?;
            Arc::new(RedisEntryStorage::new(redis::Client::open(url)?))
        }
        EntryStoreKind::Memory => {
            warn!("Entries are kept in memory and will not survive a restart");
            Arc::new(MemoryEntryStorage::new())
        }
    };
    info!("Entry storage: {}", entries.backend());

    let audio: Arc<dyn AudioStore> = match (config.audio_store, &config.s3) {
        (AudioStoreKind::S3, Some(settings)) => {
            let s3 = build_s3_client(settings).await;
            info!("S3 client initialized (bucket: {})", settings.bucket);
            Arc::new(S3AudioStore::new(s3, settings.bucket.clone()))
        }
        (AudioStoreKind::S3, None) => anyhow::bail!("S3 settings missing for AUDIO_STORE=s3"),
        (AudioStoreKind::Memory, _) => {
            warn!("Recordings are kept in memory and will not survive a restart");
            Arc::new(MemoryAudioStore::new())
        }
    };

    // Initialize LLM client
    let llm = LlmClient::new(config.openai_base_url.clone())?;
    info!(
        "LLM client initialized (chat: {}, transcription: {})",
        llm_client::CHAT_MODEL,
        llm_client::TRANSCRIPTION_MODEL
    );
    if config.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY not set: insights and transcription are disabled");
    }

    let transcriber = Arc::new(WhisperTranscriber::new(
        llm.clone(),
        config.openai_api_key.clone(),
    ));

    let insights = Arc::new(InsightManager::new(
        entries.clone(),
        Arc::new(PgInsightRepository::new(db)),
        Arc::new(LlmSummarizer::new(llm)),
        config.openai_api_key.clone(),
    ));
    let warm = insights.load_latest().await;
    info!("Initial insight load: {}", warm.status());

    // Build app state
    let state = AppState {
        entries,
        audio,
        transcriber,
        insights,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(settings: &S3Settings) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &settings.access_key_id,
        &settings.secret_access_key,
        None,
        None,
        "voicejournal-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&settings.endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
