//! Cache Entry Module
//!
//! Defines the stored value types and individual cache entries with TTL support.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

// == Content Hash ==
/// Opaque identifier of a blob, used as the cache key.
///
/// Hashes arriving over the wire are taken as-is; [`ContentHash::digest`]
/// produces the lowercase hex SHA-256 form clients are expected to send.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ContentHash(String);

impl ContentHash {
    /// Computes the lowercase hex SHA-256 of `bytes`.
    pub fn digest(bytes: impl AsRef<[u8]>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes.as_ref());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Prefix safe to put in log lines.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(12) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl From<String> for ContentHash {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ContentHash {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Blob ==
/// A cached payload: source text or raw image bytes.
///
/// Cloning is cheap; readers get a shared immutable view of the stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Blob {
    Text(Arc<str>),
    Binary(Arc<[u8]>),
}

impl Blob {
    /// Size of the payload in bytes.
    pub fn len(&self) -> usize {
        match self {
            Blob::Text(text) => text.len(),
            Blob::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Blob::Text(text) => text.as_bytes(),
            Blob::Binary(bytes) => bytes.as_ref(),
        }
    }

    /// Returns the text when this blob holds source code.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Blob::Text(text) => Some(text.as_ref()),
            Blob::Binary(_) => None,
        }
    }
}

impl From<String> for Blob {
    fn from(value: String) -> Self {
        Blob::Text(Arc::from(value))
    }
}

impl From<&str> for Blob {
    fn from(value: &str) -> Self {
        Blob::Text(Arc::from(value))
    }
}

impl From<Vec<u8>> for Blob {
    fn from(value: Vec<u8>) -> Self {
        Blob::Binary(Arc::from(value))
    }
}

// == Cache Entry ==
/// A single cache entry: the value and the instant it was last written.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: Blob,
    /// Last insert or overwrite
    pub written_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    pub fn new(value: Blob, written_at: Instant) -> Self {
        Self { value, written_at }
    }

    // == Is Expired ==
    /// Checks if the entry has outlived `ttl` as of `now`.
    ///
    /// Boundary condition: an entry whose age equals the TTL exactly is still
    /// live; it expires once its age is strictly greater than the TTL. The
    /// lazy read path and the periodic sweep both go through this method.
    pub fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        self.age(now) > ttl
    }

    // == Age ==
    /// Time elapsed since the last write, saturating at zero.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.written_at)
    }
}
