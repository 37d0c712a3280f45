use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::audio::StoredAudio;
use crate::errors::AppError;
use crate::journal::entry_key::EntryKey;
use crate::journal::handlers::parse_path_key;
use crate::journal::storage::record_entry;
use crate::state::AppState;

const DEFAULT_AUDIO_TYPE: &str = "audio/webm";

#[derive(Debug, Serialize)]
pub struct RecordingResponse {
    pub entry_key: EntryKey,
    pub content: String,
}

/// POST /api/v1/recordings
///
/// Multipart body: `audio` (the recording) and an optional `date`
/// (`YYYY-MM-DD`) to backfill a missed day. Transcribes, saves the entry and
/// keeps the audio under the same key.
pub async fn handle_create_recording(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<RecordingResponse>), AppError> {
    let mut audio: Option<StoredAudio> = None;
    let mut date: Option<NaiveDate> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("audio") => {
                let content_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_AUDIO_TYPE)
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable audio field: {e}")))?;
                audio = Some(StoredAudio {
                    bytes,
                    content_type,
                });
            }
            Some("date") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable date field: {e}")))?;
                let parsed = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| {
                    AppError::Validation(format!("date must be YYYY-MM-DD, got '{text}'"))
                })?;
                date = Some(parsed);
            }
            _ => {}
        }
    }

    let audio = audio.ok_or_else(|| AppError::Validation("missing audio field".to_string()))?;

    let content = state
        .transcriber
        .transcribe(audio.bytes.clone(), &audio.content_type)
        .await?;
    if content.is_empty() {
        return Err(AppError::Validation(
            "No speech detected in recording".to_string(),
        ));
    }

    let entry_key = record_entry(state.entries.as_ref(), &content, date).await?;
    // An entry without its recording is rolled back so a retry starts clean.
    if let Err(e) = state.audio.persist(&entry_key, audio).await {
        if let Err(rollback) = state.entries.delete(&entry_key).await {
            warn!("Failed to roll back entry {entry_key}: {rollback}");
        }
        return Err(e);
    }
    info!(
        "Recorded entry {entry_key} via {} transcription",
        state.transcriber.engine_label()
    );

    Ok((
        StatusCode::CREATED,
        Json(RecordingResponse { entry_key, content }),
    ))
}

/// GET /api/v1/recordings/:key
pub async fn handle_get_recording(
    State(state): State<AppState>,
    Path(raw_key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entry_key = parse_path_key(&raw_key)?;
    let audio = state
        .audio
        .load(&entry_key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No recording for entry {entry_key}")))?;

    Ok(([(header::CONTENT_TYPE, audio.content_type)], audio.bytes))
}
