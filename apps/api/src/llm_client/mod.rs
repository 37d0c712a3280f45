/// LLM Client: the single point of entry for all OpenAI API calls in the journal.
///
/// ARCHITECTURAL RULE: No other module may call the OpenAI API directly.
/// Chat completions (insights) and audio transcriptions (recordings) both go through here.
///
/// Models are hardcoded; do not make configurable to prevent drift.
use bytes::Bytes;
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// The chat model used for insight generation.
pub const CHAT_MODEL: &str = "gpt-5.2";
/// The speech-to-text model used for recordings.
pub const TRANSCRIPTION_MODEL: &str = "whisper-1";
const TRANSCRIPTION_LANGUAGE: &str = "en";
const TEMPERATURE: f64 = 0.7;
const MAX_COMPLETION_TOKENS: u32 = 1024;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: Role,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage<'a>],
    temperature: f64,
    max_completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Extracts the text content of the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

/// The single OpenAI client shared by the summarizer and the transcriber.
/// The API key is supplied per call so an unconfigured key is caught by the caller.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
}

impl LlmClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Makes a chat-completion call, returning the full response object.
    pub async fn chat(
        &self,
        api_key: &str,
        messages: &[ChatMessage<'_>],
    ) -> Result<ChatResponse, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request_body = ChatRequest {
            model: CHAT_MODEL,
            messages,
            temperature: TEMPERATURE,
            max_completion_tokens: MAX_COMPLETION_TOKENS,
        };

        let response = self
            .send_with_retry(|| {
                Ok(self
                    .client
                    .post(&url)
                    .bearer_auth(api_key)
                    .json(&request_body))
            })
            .await?;

        let chat: ChatResponse = response.json().await?;
        if let Some(usage) = &chat.usage {
            debug!(
                "Chat call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }
        Ok(chat)
    }

    /// Calls the chat endpoint and deserializes the text response as JSON.
    /// The system prompt must instruct the model to return valid JSON.
    pub async fn chat_json<T: DeserializeOwned>(
        &self,
        api_key: &str,
        system: &str,
        prompt: &str,
    ) -> Result<T, LlmError> {
        let messages = [
            ChatMessage {
                role: Role::System,
                content: system,
            },
            ChatMessage {
                role: Role::User,
                content: prompt,
            },
        ];
        let response = self.chat(api_key, &messages).await?;

        let text = response.text().ok_or(LlmError::EmptyContent)?;

        // Strip markdown code fences if the model wraps JSON in them
        let text = strip_json_fences(text);

        serde_json::from_str(text).map_err(LlmError::Parse)
    }

    /// Uploads recorded audio to the transcription endpoint and returns the text.
    pub async fn transcribe(
        &self,
        api_key: &str,
        audio: Bytes,
        file_name: &str,
        content_type: &str,
    ) -> Result<String, LlmError> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let response = self
            .send_with_retry(|| {
                let file = multipart::Part::stream(audio.clone())
                    .file_name(file_name.to_string())
                    .mime_str(content_type)?;
                let form = multipart::Form::new()
                    .part("file", file)
                    .text("model", TRANSCRIPTION_MODEL)
                    .text("language", TRANSCRIPTION_LANGUAGE);
                Ok(self.client.post(&url).bearer_auth(api_key).multipart(form))
            })
            .await?;

        let transcription: TranscriptionResponse = response.json().await?;
        debug!("Transcription succeeded: {} chars", transcription.text.len());
        Ok(transcription.text)
    }

    /// Sends a request built fresh for every attempt.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    async fn send_with_retry<F>(&self, build: F) -> Result<Response, LlmError>
    where
        F: Fn() -> Result<RequestBuilder, LlmError>,
    {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "OpenAI call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match build()?.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("OpenAI API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<OpenAiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            return Ok(response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start()),
        None => text,
    }
}
