//! Lia Relay - Streaming relay between editor clients and a generation backend
//!
//! Accepts multimodal requests over an authenticated WebSocket, resolves
//! hash-addressed code and screenshots through a TTL + LRU content cache, and
//! streams generated text back as tagged fragments.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod generation;
pub mod models;
pub mod session;
pub mod speech;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::{RelayError, Result};
pub use tasks::spawn_sweep_task;
