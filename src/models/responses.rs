//! Outbound message models
//!
//! Stream fragments sent back over the connection and the HTTP status bodies.

use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;

/// Lifecycle marker carried by every fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamStatus {
    InProgress,
    Completed,
    Error,
}

/// What the `data` field of a fragment holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    /// Generated assistant text
    CodeSuggestion,
    /// Stream lifecycle information
    System,
}

/// One outbound message on the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFragment {
    pub request_id: String,
    pub stream_status: StreamStatus,
    pub chunk_type: ChunkType,
    /// Serialized as `null` when absent
    pub data: Option<String>,
}

impl ResponseFragment {
    /// A generated text fragment.
    pub fn chunk(request_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            stream_status: StreamStatus::InProgress,
            chunk_type: ChunkType::CodeSuggestion,
            data: Some(text.into()),
        }
    }

    /// Terminal fragment after the last chunk.
    pub fn completed(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            stream_status: StreamStatus::Completed,
            chunk_type: ChunkType::System,
            data: None,
        }
    }

    /// Terminal fragment replacing `completed` when generation fails.
    pub fn failed(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            stream_status: StreamStatus::Error,
            chunk_type: ChunkType::System,
            data: Some(message.into()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.stream_status != StreamStatus::InProgress
    }
}

/// Response body for the liveness check (GET /health)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok" while the process serves requests
    pub status: String,
    /// Live entries in the content cache
    pub cache_size: usize,
}

impl HealthResponse {
    pub fn ok(cache_size: usize) -> Self {
        Self {
            status: "ok".to_string(),
            cache_size,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub live_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Snapshot time in RFC 3339 format
    pub timestamp: String,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            live_entries: stats.live_entries,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
