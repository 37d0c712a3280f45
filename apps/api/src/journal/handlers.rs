use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::journal::calendar::{
    find_most_recent_empty_date_from_now, format_date_for_display, CalendarView,
};
use crate::journal::entry_key::EntryKey;
use crate::journal::storage::{record_entry, EntryWithContent};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EntryKeysResponse {
    pub entry_keys: Vec<EntryKey>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    pub content: String,
    /// Backfill onto this day instead of today.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct CreateEntryResponse {
    pub entry_key: EntryKey,
    pub readable: String,
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub entry_key: EntryKey,
    pub readable: String,
    pub content: String,
    pub has_recording: bool,
}

#[derive(Debug, Serialize)]
pub struct EmptyDateResponse {
    /// `None` when every one of the last 30 days has an entry.
    pub date: Option<NaiveDate>,
    pub display: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub selected: Option<NaiveDate>,
}

/// Keys arriving in a URL are user input: a bad one is a 400, not corruption.
pub(crate) fn parse_path_key(raw: &str) -> Result<EntryKey, AppError> {
    EntryKey::parse(raw).map_err(|e| AppError::Validation(e.to_string()))
}

/// GET /api/v1/entries
pub async fn handle_list_entries(
    State(state): State<AppState>,
) -> Result<Json<EntryKeysResponse>, AppError> {
    let entry_keys = state.entries.all_keys().await?;
    Ok(Json(EntryKeysResponse { entry_keys }))
}

/// POST /api/v1/entries
pub async fn handle_create_entry(
    State(state): State<AppState>,
    Json(req): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<CreateEntryResponse>), AppError> {
    if req.content.trim().is_empty() {
        return Err(AppError::Validation("content cannot be empty".to_string()));
    }

    let entry_key = record_entry(state.entries.as_ref(), &req.content, req.date).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateEntryResponse {
            readable: entry_key.readable(),
            entry_key,
        }),
    ))
}

/// GET /api/v1/entries/:key
pub async fn handle_get_entry(
    State(state): State<AppState>,
    Path(raw_key): Path<String>,
) -> Result<Json<EntryResponse>, AppError> {
    let entry_key = parse_path_key(&raw_key)?;
    let content = state
        .entries
        .load(&entry_key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Entry {entry_key} not found")))?;
    let has_recording = state.audio.exists(&entry_key).await?;
    Ok(Json(EntryResponse {
        readable: entry_key.readable(),
        entry_key,
        content,
        has_recording,
    }))
}

/// DELETE /api/v1/entries/:key
///
/// Removes the entry and its recording, if any.
pub async fn handle_delete_entry(
    State(state): State<AppState>,
    Path(raw_key): Path<String>,
) -> Result<StatusCode, AppError> {
    let entry_key = parse_path_key(&raw_key)?;
    state.entries.delete(&entry_key).await?;
    state.audio.delete(&entry_key).await?;
    info!("Deleted entry {entry_key}");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/entries
pub async fn handle_delete_all_entries(
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let keys = state.entries.all_keys().await?;
    // Recordings go first; one that fails to delete does not stop the rest.
    for key in &keys {
        if let Err(e) = state.audio.delete(key).await {
            warn!("Failed to delete recording for {key}: {e}");
        }
    }
    state.entries.delete_all().await?;
    info!("Deleted all {} entries", keys.len());
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/entries/range?start=YYYY-MM-DD&end=YYYY-MM-DD
///
/// Both days are inclusive.
pub async fn handle_entries_in_range(
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<EntryWithContent>>, AppError> {
    if range.start > range.end {
        return Err(AppError::Validation(
            "start must not be after end".to_string(),
        ));
    }
    let start = range.start.and_hms_opt(0, 0, 0);
    let end = range.end.and_hms_opt(23, 59, 59);
    let (Some(start), Some(end)) = (start, end) else {
        return Err(AppError::Validation("invalid date range".to_string()));
    };

    Ok(Json(state.entries.in_range(start, end).await?))
}

/// GET /api/v1/calendar?selected=YYYY-MM-DD
pub async fn handle_calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CalendarView>, AppError> {
    let keys = state.entries.all_keys().await?;
    Ok(Json(CalendarView::build(
        &keys,
        query.selected,
        Local::now().date_naive(),
    )))
}

/// GET /api/v1/calendar/empty
///
/// The most recent missed day before today, for the backfill prompt.
pub async fn handle_most_recent_empty_date(
    State(state): State<AppState>,
) -> Result<Json<EmptyDateResponse>, AppError> {
    let keys = state.entries.all_keys().await?;
    let date = find_most_recent_empty_date_from_now(&keys);
    Ok(Json(EmptyDateResponse {
        date,
        display: date.map(format_date_for_display),
    }))
}
