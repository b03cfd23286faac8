//! Configuration Module
//!
//! Handles loading and managing relay configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_CLIENT_TOKEN: &str = "lia-dev-token-2024";
const DEFAULT_MAX_ENTRIES: usize = 50;
const DEFAULT_TTL_SECONDS: u64 = 900;
const DEFAULT_SWEEP_INTERVAL: u64 = 60;
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Relay configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface to bind
    pub host: String,
    /// HTTP / WebSocket port
    pub port: u16,
    /// Token every client must present when opening the stream
    pub client_token: String,
    /// Maximum number of entries the content cache can hold
    pub cache_max_entries: usize,
    /// Seconds an entry stays valid after its last write
    pub cache_ttl_secs: u64,
    /// Seconds between background sweeps of expired entries
    pub sweep_interval_secs: u64,
    /// API key for the generation backend
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    /// Enables speech-to-text for voice payloads when present
    pub speech_api_key: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `LIA_HOST` - Bind address (default: 0.0.0.0)
    /// - `LIA_PORT` - Listen port (default: 8000)
    /// - `LIA_CLIENT_TOKEN` - Expected client token (default: lia-dev-token-2024)
    /// - `CACHE_MAX_ENTRIES` - Content cache capacity (default: 50)
    /// - `CACHE_TTL_SECONDS` - Entry time-to-live (default: 900)
    /// - `CACHE_SWEEP_INTERVAL` - Seconds between sweeps (default: 60)
    /// - `GEMINI_API_KEY` - Generation backend key (no default)
    /// - `GEMINI_MODEL` - Backend model (default: gemini-1.5-pro)
    /// - `GEMINI_BASE_URL` - Backend endpoint root
    /// - `GOOGLE_SPEECH_API_KEY` - Speech services key (no default)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("LIA_HOST").unwrap_or(defaults.host),
            port: parse_var("LIA_PORT").unwrap_or(defaults.port),
            client_token: env::var("LIA_CLIENT_TOKEN").unwrap_or(defaults.client_token),
            cache_max_entries: parse_var("CACHE_MAX_ENTRIES")
                .unwrap_or(defaults.cache_max_entries),
            cache_ttl_secs: parse_var("CACHE_TTL_SECONDS").unwrap_or(defaults.cache_ttl_secs),
            sweep_interval_secs: parse_var("CACHE_SWEEP_INTERVAL")
                .unwrap_or(defaults.sweep_interval_secs),
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: env::var("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            speech_api_key: non_empty_var("GOOGLE_SPEECH_API_KEY"),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            client_token: DEFAULT_CLIENT_TOKEN.to_string(),
            cache_max_entries: DEFAULT_MAX_ENTRIES,
            cache_ttl_secs: DEFAULT_TTL_SECONDS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            speech_api_key: None,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
