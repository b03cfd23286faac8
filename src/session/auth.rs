//! Connection authentication
//!
//! A client proves itself by presenting the shared client token, either as
//! the `token` query parameter or as a bearer `Authorization` header.

use crate::error::{RelayError, Result};

/// Close code sent when the presented token is missing or wrong.
pub const AUTH_FAILURE_CLOSE_CODE: u16 = 4001;
pub const AUTH_FAILURE_REASON: &str = "invalid token";

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    let token = auth_header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Picks the presented token. The query parameter wins over the header.
pub fn presented_token<'a>(query: Option<&'a str>, auth_header: Option<&'a str>) -> Option<&'a str> {
    query
        .filter(|token| !token.is_empty())
        .or_else(|| auth_header.and_then(extract_bearer_token))
}

/// Accepts the connection only when `presented` equals `expected` exactly.
pub fn authorize(expected: &str, presented: Option<&str>) -> Result<()> {
    match presented {
        Some(token) if token == expected => Ok(()),
        Some(_) => Err(RelayError::Authentication(AUTH_FAILURE_REASON.to_string())),
        None => Err(RelayError::Authentication("no token presented".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Bearer  abc "), Some("abc"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_query_token_preferred() {
        assert_eq!(presented_token(Some("q"), Some("Bearer h")), Some("q"));
        assert_eq!(presented_token(Some(""), Some("Bearer h")), Some("h"));
        assert_eq!(presented_token(None, None), None);
    }

    #[test]
    fn test_authorize() {
        assert!(authorize("secret", Some("secret")).is_ok());
        assert!(matches!(
            authorize("secret", Some("Secret")),
            Err(RelayError::Authentication(_))
        ));
        assert!(authorize("secret", None).is_err());
    }
}
