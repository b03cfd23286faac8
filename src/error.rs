//! Error types for the relay
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Relay Error Enum ==
/// Unified error type for the relay.
///
/// A cache miss is not an error: lookups return `Option` and the request
/// continues with whatever context is available.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Presented token did not match the configured one
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Inbound frame could not be parsed as a request envelope
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// A base64 payload could not be decoded
    #[error("Invalid {field} encoding: {source}")]
    Decode {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    /// The generation backend failed to start or aborted mid-stream
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Speech-to-text collaborator failure
    #[error("Transcription failed: {0}")]
    Transcription(String),

    /// Text-to-speech collaborator failure
    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    /// The connection could not be read from or written to
    #[error("Transport error: {0}")]
    Transport(String),

    /// Internal relay error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == Result Type Alias ==
/// Convenience Result type for the relay.
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RelayError::Generation("backend down".into()).to_string(),
            "Generation failed: backend down"
        );
        assert_eq!(
            RelayError::Authentication("invalid token".into()).to_string(),
            "Authentication failed: invalid token"
        );
    }

    #[test]
    fn test_decode_error_names_field() {
        let source = base64::engine::general_purpose::STANDARD
            .decode("***")
            .unwrap_err();
        let err = RelayError::Decode {
            field: "vision.data_b64",
            source,
        };
        assert!(err.to_string().starts_with("Invalid vision.data_b64 encoding"));
    }
}
