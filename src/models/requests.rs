//! Inbound message models
//!
//! Defines the request envelope clients send over the stream.

use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};

const UNKNOWN_REQUEST_ID: &str = "unknown";

fn unknown_request_id() -> String {
    UNKNOWN_REQUEST_ID.to_string()
}

/// One multimodal request.
///
/// Every section is optional on the wire; an absent section behaves like one
/// with no hash and no data. Unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Correlates every outbound fragment with this request
    #[serde(default = "unknown_request_id")]
    pub request_id: String,
    #[serde(default)]
    pub payload: RequestPayload,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestPayload {
    #[serde(default)]
    pub code: CodeRef,
    #[serde(default)]
    pub vision: ImageRef,
    #[serde(default)]
    pub audio: AudioRef,
}

/// Source code, either inline or by reference to a cached copy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeRef {
    #[serde(default)]
    pub hash: String,
    /// Present when the sender believes the relay has not seen this hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub language: String,
}

/// Screenshot, either inline (base64) or by reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageRef {
    #[serde(default)]
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_b64: Option<String>,
}

/// Recorded voice, never cached.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_b64: Option<String>,
}

impl RequestEnvelope {
    /// Parses one inbound text frame.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| RelayError::MalformedMessage(e.to_string()))
    }
}
