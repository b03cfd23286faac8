//! Session Module
//!
//! Everything that happens on one client connection: authentication,
//! payload resolution and the request/response loop.

mod auth;
mod handler;
mod resolver;

use std::sync::Arc;

use crate::cache::ContentCache;
use crate::generation::GenerationClient;
use crate::speech::SpeechToText;

pub use auth::{
    authorize, extract_bearer_token, presented_token, AUTH_FAILURE_CLOSE_CODE,
    AUTH_FAILURE_REASON,
};
pub use handler::{Session, SessionEnd, MAX_PENDING_REQUESTS};
pub use resolver::PayloadResolver;

/// Process-wide collaborators shared by every session.
#[derive(Clone)]
pub struct SessionContext {
    pub cache: ContentCache,
    pub generator: Arc<dyn GenerationClient>,
    /// Voice payloads are ignored when absent
    pub transcriber: Option<Arc<dyn SpeechToText>>,
}
