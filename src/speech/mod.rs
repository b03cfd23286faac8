//! Speech Module
//!
//! Speech-to-text for recorded requests and text-to-speech for spoken
//! replies, each behind its own trait.

mod google;

use async_trait::async_trait;

use crate::error::Result;

pub use google::{GoogleSpeechClient, RecognitionSettings, VoiceSettings};

/// Turns recorded PCM audio into text.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Returns an empty string when no speech was detected.
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

/// Turns text into PCM audio.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Blank text yields empty audio.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}
