use std::sync::Arc;

use crate::audio::AudioStore;
use crate::insights::manager::InsightManager;
use crate::journal::storage::EntryStorage;
use crate::transcription::Transcriber;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Backend chosen by `ENTRY_STORE`.
    pub entries: Arc<dyn EntryStorage>,
    pub audio: Arc<dyn AudioStore>,
    pub transcriber: Arc<dyn Transcriber>,
    /// One manager per process, so the single-flight guard covers every request.
    pub insights: Arc<InsightManager>,
}
