//! API Handlers
//!
//! Request handlers for the stream endpoint and the HTTP status endpoints.

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header, HeaderMap},
    response::Response,
    Json,
};
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, info_span, warn, Instrument};

use crate::cache::ContentCache;
use crate::config::Config;
use crate::generation::GenerationClient;
use crate::models::{HealthResponse, StatsResponse};
use crate::session::{
    authorize, presented_token, Session, SessionContext, AUTH_FAILURE_CLOSE_CODE,
    AUTH_FAILURE_REASON,
};
use crate::speech::SpeechToText;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Collaborators handed to every session
    pub session: SessionContext,
    /// Token clients must present to open a stream
    pub client_token: Arc<str>,
}

impl AppState {
    pub fn new(session: SessionContext, client_token: impl Into<Arc<str>>) -> Self {
        Self {
            session,
            client_token: client_token.into(),
        }
    }

    /// Builds the shared cache from configuration and wires in the backends.
    pub fn from_config(
        config: &Config,
        generator: Arc<dyn GenerationClient>,
        transcriber: Option<Arc<dyn SpeechToText>>,
    ) -> Self {
        let cache = ContentCache::new(config.cache_max_entries, config.cache_ttl());
        Self::new(
            SessionContext {
                cache,
                generator,
                transcriber,
            },
            config.client_token.as_str(),
        )
    }

    pub fn cache(&self) -> &ContentCache {
        &self.session.cache
    }
}

/// Query parameters accepted when opening the stream.
#[derive(Debug, Default, Deserialize)]
pub struct StreamParams {
    pub token: Option<String>,
}

/// Handler for GET /ws/lia
///
/// Always completes the upgrade. A connection with a missing or wrong token
/// is then closed with code 4001 before any request is read.
pub async fn stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<StreamParams>,
    headers: HeaderMap,
) -> Response {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let verdict = authorize(
        &state.client_token,
        presented_token(params.token.as_deref(), auth_header),
    );
    let session_id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);

    ws.on_upgrade(move |socket| {
        async move {
            match verdict {
                Ok(()) => {
                    let (outbound, inbound) = socket.split();
                    Session::new(state.session, inbound, outbound).run().await;
                }
                Err(e) => {
                    warn!("Rejecting connection: {}", e);
                    reject(socket).await;
                }
            }
        }
        .instrument(info_span!("session", id = session_id))
    })
}

async fn reject(mut socket: WebSocket) {
    let frame = CloseFrame {
        code: AUTH_FAILURE_CLOSE_CODE,
        reason: Cow::Borrowed(AUTH_FAILURE_REASON),
    };
    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
        debug!("Close frame not delivered: {}", e);
    }
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache().stats().await;
    debug!(
        "Stats requested: hits={}, misses={}, evictions={}, live={}",
        stats.hits, stats.misses, stats.evictions, stats.live_entries
    );
    Json(StatsResponse::from(stats))
}

/// Handler for GET /health
///
/// Returns liveness and the number of live cache entries.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(state.cache().size().await))
}
