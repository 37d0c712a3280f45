//! Insight lifecycle: load, generate and feedback around a single cached insight.
//!
//! Phases: `Idle` → `Loading` → `Ready`, and `Ready` → `Generating` → `Ready`.
//! A failed operation leaves the cached insight as it was and records a
//! user-facing message in the error slot.
//!
//! Single flight: at most one load-or-generate runs at a time. A call that
//! arrives while one is running is dropped and reports `Busy`; it is not
//! queued. The flight is released by `FlightGuard::drop`, so an error or a
//! dropped future never leaves the manager wedged.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Days, Local, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::insights::models::{Feedback, InsightsResult, StoredInsight};
use crate::insights::repository::InsightRepository;
use crate::insights::summarizer::Summarizer;
use crate::journal::storage::EntryStorage;

/// Trailing window of entries analyzed per generation, in days.
pub const INSIGHT_WINDOW_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightPhase {
    Idle,
    Loading,
    Ready,
    Generating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Load,
    Generate,
}

#[derive(Debug, Default)]
struct ManagerState {
    in_flight: Option<Operation>,
    /// Set once a load or generation has completed.
    settled: bool,
    insight: Option<StoredInsight>,
    error: Option<String>,
}

impl ManagerState {
    fn phase(&self) -> InsightPhase {
        match self.in_flight {
            Some(Operation::Load) => InsightPhase::Loading,
            Some(Operation::Generate) => InsightPhase::Generating,
            None if self.settled || self.insight.is_some() => InsightPhase::Ready,
            None => InsightPhase::Idle,
        }
    }
}

/// Read-only view of the manager for the API layer.
#[derive(Debug, Clone, Serialize)]
pub struct InsightSnapshot {
    pub phase: InsightPhase,
    pub insight: Option<StoredInsight>,
    pub error: Option<String>,
}

/// Result of a guarded operation.
#[derive(Debug, Clone, PartialEq)]
pub enum FlightOutcome<T> {
    Done(T),
    /// Another load or generation was in flight; nothing happened.
    Busy,
    Failed(String),
}

impl<T> FlightOutcome<T> {
    pub fn status(&self) -> &'static str {
        match self {
            FlightOutcome::Done(_) => "done",
            FlightOutcome::Busy => "busy",
            FlightOutcome::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackOutcome {
    Recorded(Feedback),
    /// No insight loaded; nothing happened.
    NoInsight,
    Failed(String),
}

impl FeedbackOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            FeedbackOutcome::Recorded(_) => "recorded",
            FeedbackOutcome::NoInsight => "no_insight",
            FeedbackOutcome::Failed(_) => "failed",
        }
    }
}

struct FlightGuard<'a> {
    state: &'a Mutex<ManagerState>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .in_flight = None;
    }
}

pub struct InsightManager {
    entries: Arc<dyn EntryStorage>,
    repository: Arc<dyn InsightRepository>,
    summarizer: Arc<dyn Summarizer>,
    credential: Option<String>,
    state: Mutex<ManagerState>,
}

impl InsightManager {
    pub fn new(
        entries: Arc<dyn EntryStorage>,
        repository: Arc<dyn InsightRepository>,
        summarizer: Arc<dyn Summarizer>,
        credential: Option<String>,
    ) -> Self {
        Self {
            entries,
            repository,
            summarizer,
            credential: credential.filter(|c| !c.trim().is_empty()),
            state: Mutex::new(ManagerState::default()),
        }
    }

    pub fn snapshot(&self) -> InsightSnapshot {
        let state = self.lock();
        InsightSnapshot {
            phase: state.phase(),
            insight: state.insight.clone(),
            error: state.error.clone(),
        }
    }

    /// Fetches the most recent stored insight and caches it (or nothing, if
    /// none exists yet).
    pub async fn load_latest(&self) -> FlightOutcome<Option<StoredInsight>> {
        let Some(_flight) = self.try_begin(Operation::Load) else {
            debug!("Insight load dropped: another operation is in flight");
            return FlightOutcome::Busy;
        };

        match self.repository.latest().await {
            Ok(insight) => {
                let mut state = self.lock();
                state.insight = insight.clone();
                state.settled = true;
                FlightOutcome::Done(insight)
            }
            Err(e) => FlightOutcome::Failed(self.record_failure("load insights", &e)),
        }
    }

    /// Analyzes the last `INSIGHT_WINDOW_DAYS` days of entries and stores the
    /// result as the new latest insight.
    pub async fn generate(&self) -> FlightOutcome<StoredInsight> {
        let Some(credential) = self.credential.clone() else {
            let message = AppError::NotConfigured("API key").to_string();
            self.lock().error = Some(message.clone());
            return FlightOutcome::Failed(message);
        };

        let Some(_flight) = self.try_begin(Operation::Generate) else {
            debug!("Insight generation dropped: another operation is in flight");
            return FlightOutcome::Busy;
        };

        match self.run_generation(&credential, Local::now().naive_local()).await {
            Ok(insight) => {
                let mut state = self.lock();
                state.insight = Some(insight.clone());
                state.settled = true;
                FlightOutcome::Done(insight)
            }
            Err(e) => FlightOutcome::Failed(self.record_failure("generate insights", &e)),
        }
    }

    /// Overwrites the feedback on the cached insight, in the repository first
    /// and then locally.
    pub async fn submit_feedback(&self, feedback: Feedback) -> FeedbackOutcome {
        let Some(id) = self.lock().insight.as_ref().map(|i| i.id) else {
            debug!("Feedback ignored: no insight loaded");
            return FeedbackOutcome::NoInsight;
        };

        if let Err(e) = self.repository.update_feedback(id, feedback).await {
            return FeedbackOutcome::Failed(self.record_failure("save feedback", &e));
        }

        let mut state = self.lock();
        // A generation may have replaced the cached insight meanwhile.
        if let Some(insight) = state.insight.as_mut().filter(|i| i.id == id) {
            insight.feedback = Some(feedback);
        }
        info!("Recorded {feedback} feedback on insight {id}");
        FeedbackOutcome::Recorded(feedback)
    }

    async fn run_generation(
        &self,
        credential: &str,
        now: NaiveDateTime,
    ) -> Result<StoredInsight, AppError> {
        let start = now
            .checked_sub_days(Days::new(u64::from(INSIGHT_WINDOW_DAYS)))
            .unwrap_or(NaiveDateTime::MIN);
        let entries = self.entries.in_range(start, now).await?;

        let result = if entries.is_empty() {
            info!("No entries in the last {INSIGHT_WINDOW_DAYS} days; skipping summarizer");
            InsightsResult::empty()
        } else {
            info!("Generating insights over {} entries", entries.len());
            self.summarizer
                .summarize(&entries, credential, INSIGHT_WINDOW_DAYS)
                .await?
        };

        self.repository.save(&entries, &result).await
    }

    fn try_begin(&self, operation: Operation) -> Option<FlightGuard<'_>> {
        let mut state = self.lock();
        if state.in_flight.is_some() {
            return None;
        }
        state.in_flight = Some(operation);
        state.error = None;
        Some(FlightGuard { state: &self.state })
    }

    fn record_failure(&self, action: &str, error: &AppError) -> String {
        warn!("Failed to {action}: {error}");
        let message = error.to_string();
        self.lock().error = Some(message.clone());
        message
    }

    fn lock(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
