pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::audio::handlers as recordings;
use crate::insights::handlers as insights;
use crate::journal::handlers as journal;
use crate::state::AppState;

/// Upload ceiling of the transcription endpoint.
const MAX_RECORDING_BYTES: usize = 25 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Entries
        .route(
            "/api/v1/entries",
            get(journal::handle_list_entries)
                .post(journal::handle_create_entry)
                .delete(journal::handle_delete_all_entries),
        )
        .route(
            "/api/v1/entries/range",
            get(journal::handle_entries_in_range),
        )
        .route(
            "/api/v1/entries/:key",
            get(journal::handle_get_entry).delete(journal::handle_delete_entry),
        )
        .route("/api/v1/calendar", get(journal::handle_calendar))
        .route(
            "/api/v1/calendar/empty",
            get(journal::handle_most_recent_empty_date),
        )
        // Recordings
        .route(
            "/api/v1/recordings",
            post(recordings::handle_create_recording)
                .layer(DefaultBodyLimit::max(MAX_RECORDING_BYTES)),
        )
        .route(
            "/api/v1/recordings/:key",
            get(recordings::handle_get_recording),
        )
        // Insights
        .route("/api/v1/insights", get(insights::handle_get_insights))
        .route("/api/v1/insights/load", post(insights::handle_load_insights))
        .route(
            "/api/v1/insights/generate",
            post(insights::handle_generate_insights),
        )
        .route(
            "/api/v1/insights/feedback",
            post(insights::handle_submit_feedback),
        )
        .with_state(state)
}
