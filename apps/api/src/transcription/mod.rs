//! Speech-to-text for uploaded recordings.
//!
//! Capture happens on the device; the server only sees the finished audio.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::LlmClient;

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: Bytes, content_type: &str) -> Result<String, AppError>;

    fn engine_label(&self) -> &'static str {
        "unknown"
    }
}

/// Cloud transcription through the OpenAI audio endpoint.
pub struct WhisperTranscriber {
    llm: LlmClient,
    api_key: Option<String>,
}

impl WhisperTranscriber {
    pub fn new(llm: LlmClient, api_key: Option<String>) -> Self {
        Self {
            llm,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: Bytes, content_type: &str) -> Result<String, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AppError::NotConfigured("API key"))?;
        if audio.is_empty() {
            return Err(AppError::Validation("audio upload is empty".to_string()));
        }

        let size = audio.len();
        let text = self
            .llm
            .transcribe(api_key, audio, &recording_file_name(content_type), content_type)
            .await?;
        info!("Transcribed {size} bytes of {content_type} audio");
        Ok(text.trim().to_string())
    }

    fn engine_label(&self) -> &'static str {
        "whisper"
    }
}

/// The transcription endpoint infers the codec from the file extension.
pub fn recording_file_name(content_type: &str) -> String {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    let extension = match essence.as_str() {
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/ogg" => "ogg",
        _ => "webm",
    };
    format!("recording.{extension}")
}
