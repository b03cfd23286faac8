//! Gemini streaming client
//!
//! Calls `streamGenerateContent` with `alt=sse` and turns each event's
//! candidate text into one fragment.

use std::fmt::Display;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::{stream, Stream, StreamExt};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{RelayError, Result};
use crate::generation::{FragmentStream, GenerationClient, PromptPart, SseDecoder};

/// Persona and answer format sent with every prompt.
pub const SYSTEM_INSTRUCTION: &str = "You are Lia, a programming assistant that sits next to \
the developer. You receive the code they are editing, a screenshot of their screen and what \
they said out loud.\n\
Answer in the language the user spoke. Be direct and brief: point at the concrete problem or \
next step first, then show the smallest code change that solves it in a fenced block. When \
the user said nothing specific, look for bugs, risky patterns or obvious improvements in the \
visible code and mention the most relevant one.\n\
The code text you receive is the source of truth. Use the screenshot only for context, and \
when it disagrees with the text, trust the text.\n\
Some values in the code are replaced by <SECRET_REDACTED>. Never guess, reconstruct or reveal \
what they were; refer to them only as redacted values.";

/// Sampling parameters for the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 2048,
        }
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    settings: GenerationSettings,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            settings: GenerationSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, self.model, self.api_key
        )
    }

    pub(crate) fn request_body(&self, parts: &[PromptPart]) -> Value {
        let parts: Vec<Value> = parts
            .iter()
            .map(|part| match part {
                PromptPart::Text(text) => json!({ "text": text }),
                PromptPart::Image { mime_type, data } => json!({
                    "inlineData": {
                        "mimeType": mime_type,
                        "data": STANDARD.encode(data.as_bytes()),
                    }
                }),
            })
            .collect();

        json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": {
                "temperature": self.settings.temperature,
                "maxOutputTokens": self.settings.max_output_tokens,
            }
        })
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, parts: Vec<PromptPart>) -> Result<FragmentStream> {
        info!(
            "Sending prompt to {} ({} parts, {} images)",
            self.model,
            parts.len(),
            parts.iter().filter(|p| p.is_image()).count()
        );

        let response = self
            .http
            .post(self.endpoint())
            .json(&self.request_body(&parts))
            .send()
            .await
            .map_err(|e| RelayError::Generation(format!("request failed: {}", e.without_url())))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RelayError::Generation(format!(
                "backend error (status {}): {}",
                status, error_text
            )));
        }

        Ok(fragments_from_sse(response.bytes_stream()))
    }
}

/// Adapts a raw SSE byte stream into text fragments.
pub(crate) fn fragments_from_sse<S, B, E>(bytes: S) -> FragmentStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut decoder = SseDecoder::new();
    let fragments = bytes
        .map(move |chunk| match chunk {
            Ok(chunk) => decoder
                .feed(chunk.as_ref())
                .iter()
                .filter_map(|event| parse_event(event))
                .collect::<Vec<_>>(),
            Err(e) => vec![Err(RelayError::Generation(format!("stream interrupted: {}", e)))],
        })
        .flat_map(stream::iter);

    Box::pin(fragments)
}

/// Extracts the candidate text of one event.
///
/// Events with no text (usage-only trailers) yield `None`. An error object or
/// a blocked prompt yields an error.
fn parse_event(data: &str) -> Option<Result<String>> {
    let value: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(e) => {
            return Some(Err(RelayError::Generation(format!(
                "unreadable stream event: {}",
                e
            ))))
        }
    };

    if let Some(error) = value.get("error") {
        let message = error["message"].as_str().unwrap_or("unknown backend error");
        return Some(Err(RelayError::Generation(message.to_string())));
    }

    if let Some(reason) = value["promptFeedback"]["blockReason"].as_str() {
        return Some(Err(RelayError::Generation(format!(
            "prompt blocked: {}",
            reason
        ))));
    }

    let text: String = value["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        debug!("Skipping stream event without text");
        None
    } else {
        Some(Ok(text))
    }
}
