//! Summarizer: turns a window of entries into insight items.
//!
//! Trait-based so the lifecycle manager can be driven by a fake in tests.
//! `LlmSummarizer` is the production backend and goes through `LlmClient`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::insights::models::{InsightItem, InsightsResult};
use crate::insights::prompts::{ENTRY_SEPARATOR, INSIGHTS_PROMPT_TEMPLATE, INSIGHTS_SYSTEM};
use crate::journal::storage::EntryWithContent;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::LlmClient;

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        entries: &[EntryWithContent],
        credential: &str,
        window_days: u32,
    ) -> Result<InsightsResult, AppError>;
}

/// The model's reply. Only the insight list comes from the model; the
/// analyzed count is ours.
#[derive(Debug, Deserialize)]
struct InsightsReply {
    #[serde(default)]
    insights: Vec<InsightItem>,
}

pub struct LlmSummarizer {
    llm: LlmClient,
}

impl LlmSummarizer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(
        &self,
        entries: &[EntryWithContent],
        credential: &str,
        window_days: u32,
    ) -> Result<InsightsResult, AppError> {
        if entries.is_empty() {
            return Ok(InsightsResult::empty());
        }

        let system = format!("{INSIGHTS_SYSTEM}\n\n{JSON_ONLY_INSTRUCTION}");
        let prompt = build_prompt(entries, window_days);
        let reply: InsightsReply = self.llm.chat_json(credential, &system, &prompt).await?;

        info!(
            "Summarized {} entries into {} insights",
            entries.len(),
            reply.insights.len()
        );

        Ok(InsightsResult {
            insights: reply.insights,
            analyzed_entry_count: entries.len(),
        })
    }
}

/// Renders entries as `[YYYY-MM-DD]\n<content>` blocks.
fn format_entries_for_prompt(entries: &[EntryWithContent]) -> String {
    entries
        .iter()
        .map(|e| {
            format!(
                "[{}]\n{}",
                e.entry_key.calendar_date().format("%Y-%m-%d"),
                e.content.trim()
            )
        })
        .collect::<Vec<_>>()
        .join(ENTRY_SEPARATOR)
}

fn build_prompt(entries: &[EntryWithContent], window_days: u32) -> String {
    INSIGHTS_PROMPT_TEMPLATE
        .replace("{window_days}", &window_days.to_string())
        .replace("{entries}", &format_entries_for_prompt(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::entry_key::EntryKey;

    fn entry(key: &str, content: &str) -> EntryWithContent {
        EntryWithContent {
            entry_key: EntryKey::parse(key).unwrap(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_format_entries_uses_calendar_date() {
        let text = format_entries_for_prompt(&[
            entry("06-01-24_09:00:00AM", " Went running. "),
            entry("06-02-24_08:30:00PM", "Tired today."),
        ]);
        assert_eq!(
            text,
            "[2024-06-01]\nWent running.\n\n---\n\n[2024-06-02]\nTired today."
        );
    }

    #[test]
    fn test_build_prompt_mentions_window() {
        let prompt = build_prompt(&[entry("06-01-24_09:00:00AM", "hello")], 30);
        assert!(prompt.starts_with("Here are my journal entries from the past 30 days:"));
        assert!(prompt.ends_with("[2024-06-01]\nhello"));
    }

    #[test]
    fn test_reply_without_insights_field_is_empty() {
        let reply: InsightsReply = serde_json::from_str("{}").unwrap();
        assert!(reply.insights.is_empty());
    }

    #[tokio::test]
    async fn test_empty_window_makes_no_request() {
        // Unroutable base URL: any request would fail the test.
        let summarizer = LlmSummarizer::new(LlmClient::new("http://127.0.0.1:9").unwrap());
        let result = summarizer.summarize(&[], "sk-test", 30).await.unwrap();
        assert_eq!(result, InsightsResult::empty());
    }
}
