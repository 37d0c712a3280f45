use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::journal::storage::EntryWithContent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Pattern,
    Connection,
    Question,
    Suggestion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightItem {
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub title: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsResult {
    pub insights: Vec<InsightItem>,
    pub analyzed_entry_count: usize,
}

impl InsightsResult {
    /// The result for a window with no entries. Never an error.
    pub fn empty() -> Self {
        Self {
            insights: vec![],
            analyzed_entry_count: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Positive,
    Neutral,
    Negative,
}

impl Feedback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feedback::Positive => "positive",
            Feedback::Neutral => "neutral",
            Feedback::Negative => "negative",
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feedback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Feedback::Positive),
            "neutral" => Ok(Feedback::Neutral),
            "negative" => Ok(Feedback::Negative),
            other => Err(format!("unknown feedback value '{other}'")),
        }
    }
}

/// A persisted insight. `entries_snapshot` freezes exactly what was analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredInsight {
    pub id: i64,
    pub entries_snapshot: Vec<EntryWithContent>,
    pub entry_count: usize,
    pub result: InsightsResult,
    pub feedback: Option<Feedback>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insights_result_wire_shape() {
        let body = r#"{
            "insights": [
                {"type": "connection", "title": "Sleep and mood", "description": "d", "icon": "link-outline"}
            ],
            "analyzedEntryCount": 4
        }"#;
        let result: InsightsResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.analyzed_entry_count, 4);
        assert_eq!(result.insights[0].insight_type, InsightType::Connection);

        let back = serde_json::to_value(&result).unwrap();
        assert_eq!(back["analyzedEntryCount"], 4);
        assert_eq!(back["insights"][0]["type"], "connection");
    }

    #[test]
    fn test_superseded_insight_types_rejected() {
        let body = r#"{"type": "mood", "title": "t", "description": "d", "icon": "i"}"#;
        assert!(serde_json::from_str::<InsightItem>(body).is_err());
    }

    #[test]
    fn test_feedback_round_trips_through_str() {
        for feedback in [Feedback::Positive, Feedback::Neutral, Feedback::Negative] {
            assert_eq!(feedback.as_str().parse::<Feedback>(), Ok(feedback));
        }
        assert!("meh".parse::<Feedback>().is_err());
    }

    #[test]
    fn test_empty_result() {
        assert_eq!(
            serde_json::to_value(InsightsResult::empty()).unwrap(),
            serde_json::json!({"insights": [], "analyzedEntryCount": 0})
        );
    }
}
