//! Session Handler
//!
//! Drives one authenticated connection: reads request envelopes one at a
//! time, streams the generated response back as fragments, and ends the
//! request with exactly one terminal fragment.
//!
//! The inbound side keeps being read while a response streams. Requests that
//! arrive meanwhile are queued and served in arrival order after the current
//! one, so responses never interleave. A close or disconnect observed at any
//! point ends the session and drops the in-flight generation.
//!
//! At most `MAX_PENDING_REQUESTS` requests wait in the queue. Once it is full
//! the socket is not read again until a response finishes, which pushes back
//! on the client instead of buffering without limit.

use std::collections::VecDeque;
use std::fmt::Display;

use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tracing::{debug, error, info, warn};

use crate::error::RelayError;
use crate::models::{RequestEnvelope, ResponseFragment};
use crate::session::{PayloadResolver, SessionContext};

/// Requests allowed to wait behind the one being served
pub const MAX_PENDING_REQUESTS: usize = 8;

/// Why a session stopped.
#[derive(Debug)]
pub enum SessionEnd {
    /// Close frame received, or the connection dropped
    PeerClosed,
    /// A fragment could not be written
    Failed(RelayError),
}

pub struct Session<I, O> {
    context: SessionContext,
    inbound: I,
    outbound: O,
    pending: VecDeque<String>,
}

impl<I, O, E> Session<I, O>
where
    I: Stream<Item = std::result::Result<Message, E>> + Unpin,
    O: Sink<Message> + Unpin,
    O::Error: Display,
    E: Display,
{
    pub fn new(context: SessionContext, inbound: I, outbound: O) -> Self {
        Self {
            context,
            inbound,
            outbound,
            pending: VecDeque::new(),
        }
    }

    /// Serves requests until the peer leaves or the connection fails.
    pub async fn run(mut self) -> SessionEnd {
        info!("Session opened");

        let end = loop {
            let text = match self.next_text().await {
                Ok(text) => text,
                Err(end) => break end,
            };

            let request = match RequestEnvelope::parse(&text) {
                Ok(request) => request,
                Err(e) => {
                    warn!("Skipping inbound frame: {}", e);
                    continue;
                }
            };

            if let Err(end) = self.serve(request).await {
                break end;
            }
        };

        match &end {
            SessionEnd::PeerClosed => info!("Session closed by peer"),
            SessionEnd::Failed(e) => warn!("Session ended: {}", e),
        }
        end
    }

    /// Next request text, queued ones first.
    async fn next_text(&mut self) -> Result<String, SessionEnd> {
        loop {
            if let Some(text) = self.pending.pop_front() {
                return Ok(text);
            }
            let inbound = self.inbound.next().await;
            self.accept(inbound)?;
        }
    }

    fn has_room(&self) -> bool {
        self.pending.len() < MAX_PENDING_REQUESTS
    }

    /// Files one inbound item: text is queued, control frames are absorbed,
    /// and a close or a dropped connection ends the session.
    fn accept(&mut self, inbound: Option<Result<Message, E>>) -> Result<(), SessionEnd> {
        match inbound {
            Some(Ok(Message::Text(text))) => self.pending.push_back(text),
            Some(Ok(Message::Binary(bytes))) => {
                warn!("Skipping binary frame ({} bytes)", bytes.len())
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
            Some(Ok(Message::Close(_))) | None => return Err(SessionEnd::PeerClosed),
            Some(Err(e)) => {
                debug!("Connection dropped: {}", e);
                return Err(SessionEnd::PeerClosed);
            }
        }
        Ok(())
    }

    async fn serve(&mut self, request: RequestEnvelope) -> Result<(), SessionEnd> {
        let request_id = request.request_id;
        info!(request_id = %request_id, "Processing request");

        let resolver = PayloadResolver::new(
            &self.context.cache,
            self.context.transcriber.as_deref(),
        );
        let parts = resolver.resolve(request.payload).await.into_parts();

        let generator = self.context.generator.clone();
        let started = {
            let generation = generator.generate(parts);
            tokio::pin!(generation);
            loop {
                tokio::select! {
                    biased;
                    inbound = self.inbound.next(), if self.has_room() => self.accept(inbound).map_err(|end| {
                        info!(request_id = %request_id, "Peer left before generation started");
                        end
                    })?,
                    started = &mut generation => break started,
                }
            }
        };

        let mut fragments = match started {
            Ok(fragments) => fragments,
            Err(e) => {
                error!(request_id = %request_id, "{}", e);
                return self
                    .send(ResponseFragment::failed(&request_id, e.to_string()))
                    .await;
            }
        };

        let mut sent = 0usize;
        loop {
            tokio::select! {
                biased;
                inbound = self.inbound.next(), if self.has_room() => self.accept(inbound).map_err(|end| {
                    info!(request_id = %request_id, sent, "Peer left mid-stream, abandoning generation");
                    end
                })?,
                fragment = fragments.next() => match fragment {
                    Some(Ok(text)) => {
                        sent += 1;
                        self.send(ResponseFragment::chunk(&request_id, text)).await?;
                    }
                    Some(Err(e)) => {
                        error!(request_id = %request_id, sent, "{}", e);
                        return self
                            .send(ResponseFragment::failed(&request_id, e.to_string()))
                            .await;
                    }
                    None => {
                        info!(request_id = %request_id, sent, "Response complete");
                        return self.send(ResponseFragment::completed(&request_id)).await;
                    }
                },
            }
        }
    }

    async fn send(&mut self, fragment: ResponseFragment) -> Result<(), SessionEnd> {
        let text = serde_json::to_string(&fragment)
            .map_err(|e| SessionEnd::Failed(RelayError::Internal(e.to_string())))?;
        self.outbound
            .send(Message::Text(text))
            .await
            .map_err(|e| SessionEnd::Failed(RelayError::Transport(e.to_string())))
    }
}
