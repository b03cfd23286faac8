//! Generation Module
//!
//! The seam between the relay and the text generation backend. A backend
//! receives an ordered list of prompt parts and answers with a lazy stream of
//! text fragments.

mod gemini;
mod prompt;
#[cfg(any(test, feature = "testing"))]
mod scripted;
mod sse;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::cache::Blob;
use crate::error::Result;

pub use gemini::{GeminiClient, GenerationSettings, SYSTEM_INSTRUCTION};
pub use prompt::{PromptContext, NO_UTTERANCE_NOTE, SCREENSHOT_NOTE, UNKNOWN_LANGUAGE};
#[cfg(any(test, feature = "testing"))]
pub use scripted::{Script, ScriptedGenerator};
pub use sse::SseDecoder;

/// One element of a composed prompt. Order is significant to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptPart {
    Text(String),
    Image { mime_type: &'static str, data: Blob },
}

impl PromptPart {
    pub fn text(text: impl Into<String>) -> Self {
        PromptPart::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PromptPart::Text(text) => Some(text),
            PromptPart::Image { .. } => None,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, PromptPart::Image { .. })
    }
}

/// Lazy, ordered fragments of generated text. The first `Err` ends the
/// response; dropping the stream abandons the backend call.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A text generation backend.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Starts generating a response for `parts`.
    async fn generate(&self, parts: Vec<PromptPart>) -> Result<FragmentStream>;
}
