//! In-process generation backend driven by a fixed script.
//!
//! Lets the session and the server be exercised without a network backend.
//! Every prompt it receives is recorded for inspection. Built only for unit
//! tests and with the `testing` feature, which the integration tests enable.

use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures::{stream, Stream, StreamExt};
use tokio::sync::Mutex;

use crate::error::{RelayError, Result};
use crate::generation::{FragmentStream, GenerationClient, PromptPart};

/// How every call to the scripted backend plays out.
#[derive(Debug, Clone)]
pub enum Script {
    /// Yields the fragments, then ends normally
    Reply(Vec<String>),
    /// Yields the fragments, then fails mid-stream
    FailAfter(Vec<String>, String),
    /// Fails before producing a stream
    Reject(String),
    /// Yields the fragments, then never finishes
    Stall(Vec<String>),
}

impl Script {
    pub fn reply<I, T>(fragments: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Script::Reply(fragments.into_iter().map(Into::into).collect())
    }
}

pub struct ScriptedGenerator {
    script: Script,
    delay: Duration,
    prompts: Mutex<Vec<Vec<PromptPart>>>,
    open_streams: Arc<AtomicUsize>,
}

impl ScriptedGenerator {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
            open_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Waits `delay` before each fragment.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Prompts received so far, oldest first.
    pub async fn prompts(&self) -> Vec<Vec<PromptPart>> {
        self.prompts.lock().await.clone()
    }

    /// Streams handed out and not yet dropped.
    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationClient for ScriptedGenerator {
    async fn generate(&self, parts: Vec<PromptPart>) -> Result<FragmentStream> {
        self.prompts.lock().await.push(parts);

        let (fragments, tail): (&[String], FragmentStream) = match &self.script {
            Script::Reply(fragments) => (fragments, Box::pin(stream::empty::<Result<String>>())),
            Script::FailAfter(fragments, message) => (
                fragments,
                Box::pin(stream::once(futures::future::ready(Err(
                    RelayError::Generation(message.clone()),
                )))),
            ),
            Script::Reject(message) => return Err(RelayError::Generation(message.clone())),
            Script::Stall(fragments) => (fragments, Box::pin(stream::pending::<Result<String>>())),
        };

        let delay = self.delay;
        let head = stream::iter(fragments.to_vec()).then(move |fragment| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok::<_, RelayError>(fragment)
        });

        self.open_streams.fetch_add(1, Ordering::SeqCst);
        Ok(Box::pin(Tracked {
            inner: Box::pin(head.chain(tail)),
            open: self.open_streams.clone(),
        }))
    }
}

/// Counts itself out of `open` when dropped.
struct Tracked {
    inner: FragmentStream,
    open: Arc<AtomicUsize>,
}

impl Stream for Tracked {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}
