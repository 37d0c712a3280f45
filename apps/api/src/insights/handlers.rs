use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::insights::manager::{FeedbackOutcome, FlightOutcome, InsightSnapshot};
use crate::insights::models::Feedback;
use crate::state::AppState;

/// Every insight action answers 200 with what happened and the state after
/// it; a dropped or failed action is an outcome, not a transport error.
#[derive(Debug, Serialize)]
pub struct InsightActionResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub state: InsightSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub feedback: Feedback,
}

fn flight_response<T>(outcome: FlightOutcome<T>, state: InsightSnapshot) -> InsightActionResponse {
    let status = outcome.status();
    let message = match outcome {
        FlightOutcome::Failed(message) => Some(message),
        FlightOutcome::Done(_) | FlightOutcome::Busy => None,
    };
    InsightActionResponse {
        status,
        message,
        state,
    }
}

/// GET /api/v1/insights
pub async fn handle_get_insights(State(state): State<AppState>) -> Json<InsightSnapshot> {
    Json(state.insights.snapshot())
}

/// POST /api/v1/insights/load
pub async fn handle_load_insights(State(state): State<AppState>) -> Json<InsightActionResponse> {
    let outcome = state.insights.load_latest().await;
    Json(flight_response(outcome, state.insights.snapshot()))
}

/// POST /api/v1/insights/generate
pub async fn handle_generate_insights(
    State(state): State<AppState>,
) -> Json<InsightActionResponse> {
    let outcome = state.insights.generate().await;
    Json(flight_response(outcome, state.insights.snapshot()))
}

/// POST /api/v1/insights/feedback
pub async fn handle_submit_feedback(
    State(state): State<AppState>,
    Json(req): Json<FeedbackRequest>,
) -> Json<InsightActionResponse> {
    let outcome = state.insights.submit_feedback(req.feedback).await;
    let status = outcome.status();
    let message = match outcome {
        FeedbackOutcome::Failed(message) => Some(message),
        FeedbackOutcome::Recorded(_) | FeedbackOutcome::NoInsight => None,
    };
    Json(InsightActionResponse {
        status,
        message,
        state: state.insights.snapshot(),
    })
}
