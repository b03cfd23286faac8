//! Payload resolution
//!
//! Turns the code, vision and audio sections of a request into prompt
//! context: inline content is cached under its hash, references are looked
//! up, and audio is transcribed when a transcriber is configured. Nothing
//! here fails the request; a section that cannot be resolved is absent.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, info, warn};

use crate::cache::{Blob, ContentCache, ContentHash};
use crate::error::RelayError;
use crate::generation::PromptContext;
use crate::models::{AudioRef, CodeRef, ImageRef, RequestPayload};
use crate::speech::SpeechToText;

pub struct PayloadResolver<'a> {
    cache: &'a ContentCache,
    transcriber: Option<&'a dyn SpeechToText>,
}

impl<'a> PayloadResolver<'a> {
    pub fn new(cache: &'a ContentCache, transcriber: Option<&'a dyn SpeechToText>) -> Self {
        Self { cache, transcriber }
    }

    pub async fn resolve(&self, payload: RequestPayload) -> PromptContext {
        let language = payload.code.language.clone();
        PromptContext {
            code: self.resolve_code(payload.code).await,
            language,
            image: self.resolve_image(payload.vision).await,
            transcript: self.transcribe(payload.audio).await,
        }
    }

    async fn resolve_code(&self, code: CodeRef) -> Option<Blob> {
        let hash = ContentHash::from(code.hash);

        if let Some(content) = code.content {
            let blob = Blob::from(content);
            self.remember(hash, blob.clone(), "code").await;
            return Some(blob);
        }

        if hash.is_empty() {
            return None;
        }

        let found = self.cache.get(&hash).await;
        match &found {
            Some(blob) => debug!("Code cache hit {} ({} bytes)", hash.short(), blob.len()),
            None => warn!("Code cache miss for hash {}", hash.short()),
        }
        found
    }

    async fn resolve_image(&self, vision: ImageRef) -> Option<Blob> {
        let hash = ContentHash::from(vision.hash);

        if let Some(encoded) = vision.data_b64 {
            return match decode("vision.data_b64", &encoded) {
                Ok(bytes) => {
                    let blob = Blob::from(bytes);
                    self.remember(hash, blob.clone(), "image").await;
                    Some(blob)
                }
                Err(e) => {
                    warn!("Dropping image: {}", e);
                    None
                }
            };
        }

        if hash.is_empty() {
            return None;
        }

        let found = self.cache.get(&hash).await;
        if found.is_none() {
            debug!("Image cache miss for hash {}", hash.short());
        }
        found
    }

    async fn transcribe(&self, audio: AudioRef) -> Option<String> {
        let encoded = audio.data_b64.filter(|data| !data.is_empty())?;

        let bytes = match decode("audio.data_b64", &encoded) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Dropping audio: {}", e);
                return None;
            }
        };
        info!("Audio received ({} bytes)", bytes.len());

        let Some(transcriber) = self.transcriber else {
            debug!("No speech-to-text configured, ignoring audio");
            return None;
        };

        match transcriber.transcribe(&bytes).await {
            Ok(transcript) if !transcript.trim().is_empty() => Some(transcript),
            Ok(_) => None,
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    /// Caches inline content under its declared hash. Content without a hash
    /// is used for this request only.
    async fn remember(&self, hash: ContentHash, blob: Blob, kind: &str) {
        if hash.is_empty() {
            debug!("Inline {} has no hash, not caching", kind);
            return;
        }

        if ContentHash::digest(blob.as_bytes()) != hash {
            warn!("Declared {} hash {} differs from its sha256", kind, hash.short());
        }

        debug!("Caching {} {} ({} bytes)", kind, hash.short(), blob.len());
        self.cache.put(hash, blob).await;
    }
}

fn decode(field: &'static str, encoded: &str) -> Result<Vec<u8>, RelayError> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|source| RelayError::Decode { field, source })
}
