//! Wire models for the relay
//!
//! Inbound request envelopes, outbound stream fragments and the bodies of the
//! HTTP status endpoints.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{AudioRef, CodeRef, ImageRef, RequestEnvelope, RequestPayload};
pub use responses::{ChunkType, HealthResponse, ResponseFragment, StatsResponse, StreamStatus};
