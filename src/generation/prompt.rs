//! Prompt composition from resolved request context.

use crate::cache::Blob;
use crate::generation::PromptPart;

/// Label used when the client did not name the code's language.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Follows the screenshot so the backend knows what the image is.
pub const SCREENSHOT_NOTE: &str = "The image above is a screenshot of the user's screen.";

/// Stands in for the transcript when the user said nothing usable.
pub const NO_UTTERANCE_NOTE: &str = "The user activated the assistant without saying anything \
     specific. Look at the code and the screen and offer proactive help.";

const SCREENSHOT_MIME: &str = "image/png";

/// Everything a request resolved to, ready to be turned into prompt parts.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    /// Source code, inline or recovered from the cache
    pub code: Option<Blob>,
    /// Caller-supplied label, passed through untouched
    pub language: String,
    pub image: Option<Blob>,
    pub transcript: Option<String>,
}

impl PromptContext {
    /// Builds the ordered prompt: code block, then screenshot and its note,
    /// then the transcript or the no-utterance note.
    ///
    /// Empty code, empty images and blank transcripts count as absent.
    pub fn into_parts(self) -> Vec<PromptPart> {
        let mut parts = Vec::with_capacity(4);

        if let Some(code) = self
            .code
            .as_ref()
            .and_then(Blob::as_text)
            .filter(|code| !code.is_empty())
        {
            let language = match self.language.trim() {
                "" => UNKNOWN_LANGUAGE,
                label => label,
            };
            parts.push(PromptPart::Text(format!(
                "CURRENT USER CODE (language: {language}):\n```{language}\n{code}\n```"
            )));
        }

        if let Some(image) = self.image.filter(|image| !image.is_empty()) {
            parts.push(PromptPart::Image {
                mime_type: SCREENSHOT_MIME,
                data: image,
            });
            parts.push(PromptPart::text(SCREENSHOT_NOTE));
        }

        match self.transcript.filter(|t| !t.trim().is_empty()) {
            Some(transcript) => {
                parts.push(PromptPart::Text(format!("THE USER SAID: \"{transcript}\"")))
            }
            None => parts.push(PromptPart::text(NO_UTTERANCE_NOTE)),
        }

        parts
    }
}
