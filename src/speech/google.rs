//! Google Cloud Speech-to-Text and Text-to-Speech over REST.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{RelayError, Result};
use crate::speech::{SpeechToText, TextToSpeech};

pub const SPEECH_BASE_URL: &str = "https://speech.googleapis.com";
pub const TTS_BASE_URL: &str = "https://texttospeech.googleapis.com";

/// Recognition parameters for inbound voice.
#[derive(Debug, Clone)]
pub struct RecognitionSettings {
    pub sample_rate_hz: u32,
    pub language_code: String,
    pub alternative_language_codes: Vec<String>,
    pub model: String,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            sample_rate_hz: 16_000,
            language_code: "es-419".to_string(),
            alternative_language_codes: vec!["en-US".to_string()],
            model: "latest_long".to_string(),
        }
    }
}

/// Voice used for synthesized replies.
#[derive(Debug, Clone)]
pub struct VoiceSettings {
    pub language_code: String,
    pub name: String,
    pub gender: String,
    pub sample_rate_hz: u32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            language_code: "es-419".to_string(),
            name: "es-US-Wavenet-A".to_string(),
            gender: "FEMALE".to_string(),
            sample_rate_hz: 24_000,
        }
    }
}

pub struct GoogleSpeechClient {
    http: reqwest::Client,
    api_key: String,
    speech_base_url: String,
    tts_base_url: String,
    recognition: RecognitionSettings,
    voice: VoiceSettings,
}

impl GoogleSpeechClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            speech_base_url: SPEECH_BASE_URL.to_string(),
            tts_base_url: TTS_BASE_URL.to_string(),
            recognition: RecognitionSettings::default(),
            voice: VoiceSettings::default(),
        }
    }

    /// Points both services at other hosts.
    pub fn with_base_urls(mut self, speech: impl Into<String>, tts: impl Into<String>) -> Self {
        self.speech_base_url = speech.into().trim_end_matches('/').to_string();
        self.tts_base_url = tts.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_recognition(mut self, recognition: RecognitionSettings) -> Self {
        self.recognition = recognition;
        self
    }

    pub fn with_voice(mut self, voice: VoiceSettings) -> Self {
        self.voice = voice;
        self
    }

    pub(crate) fn recognize_body(&self, audio: &[u8]) -> Value {
        json!({
            "config": {
                "encoding": "LINEAR16",
                "sampleRateHertz": self.recognition.sample_rate_hz,
                "languageCode": self.recognition.language_code,
                "alternativeLanguageCodes": self.recognition.alternative_language_codes,
                "model": self.recognition.model,
                "enableAutomaticPunctuation": true,
            },
            "audio": { "content": STANDARD.encode(audio) }
        })
    }

    pub(crate) fn synthesize_body(&self, text: &str) -> Value {
        json!({
            "input": { "text": text },
            "voice": {
                "languageCode": self.voice.language_code,
                "name": self.voice.name,
                "ssmlGender": self.voice.gender,
            },
            "audioConfig": {
                "audioEncoding": "LINEAR16",
                "sampleRateHertz": self.voice.sample_rate_hz,
            }
        })
    }

    /// Posts `body` and returns the decoded JSON reply. Failures are mapped
    /// through `wrap` so each service reports its own error kind.
    async fn call(&self, url: String, body: &Value, wrap: fn(String) -> RelayError) -> Result<Value> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| wrap(format!("request failed: {}", e.without_url())))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(wrap(format!("service error (status {}): {}", status, error_text)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| wrap(format!("unreadable response: {}", e.without_url())))
    }
}

/// Joins the top alternative of every result with single spaces.
pub(crate) fn transcript_from(response: &Value) -> String {
    response["results"]
        .as_array()
        .map(|results| {
            results
                .iter()
                .filter_map(|result| result["alternatives"][0]["transcript"].as_str())
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

#[async_trait]
impl SpeechToText for GoogleSpeechClient {
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        info!("Sending audio to speech recognition ({} bytes)", audio.len());

        let url = format!("{}/v1/speech:recognize?key={}", self.speech_base_url, self.api_key);
        let response = self
            .call(url, &self.recognize_body(audio), RelayError::Transcription)
            .await?;

        let transcript = transcript_from(&response);
        if transcript.is_empty() {
            info!("No speech detected in audio");
        } else {
            debug!("Transcript ready ({} chars)", transcript.chars().count());
        }
        Ok(transcript)
    }
}

#[async_trait]
impl TextToSpeech for GoogleSpeechClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        info!("Synthesizing speech ({} chars)", text.chars().count());

        let url = format!("{}/v1/text:synthesize?key={}", self.tts_base_url, self.api_key);
        let response = self
            .call(url, &self.synthesize_body(text), RelayError::Synthesis)
            .await?;

        let encoded = response["audioContent"]
            .as_str()
            .ok_or_else(|| RelayError::Synthesis("response has no audioContent".to_string()))?;
        let audio = STANDARD
            .decode(encoded)
            .map_err(|source| RelayError::Decode {
                field: "audioContent",
                source,
            })?;

        info!("Synthesized {} bytes of audio", audio.len());
        Ok(audio)
    }
}
