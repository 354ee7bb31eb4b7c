//! SessionToken Value Object
//!
//! Opaque, unguessable session identifier carried in the session cookie.
//! 32 bytes of OS randomness mixed with the server's session secret through
//! HMAC-SHA256, rendered as base64url without padding (43 characters).
//!
//! The raw token is a bearer secret: `Debug` is redacted and there is no
//! `Display`. Logs use [`SessionToken::linkage`] instead.

use platform::crypto::{from_base64url, hmac_sha256, sha256, to_base64url, try_random_bytes};

use crate::error::{AuthError, AuthResult};

/// Random bytes drawn per token
pub const TOKEN_ENTROPY_BYTES: usize = 32;

/// Encoded token length (base64url, no padding, of 32 bytes)
pub const TOKEN_ENCODED_LEN: usize = 43;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Draw a new token
    ///
    /// Fails with [`AuthError::EntropyUnavailable`] if the OS RNG fails.
    pub fn generate(session_secret: &[u8]) -> AuthResult<Self> {
        let random = try_random_bytes(TOKEN_ENTROPY_BYTES).map_err(|e| {
            tracing::error!(error = %e, "OS random number generator failed");
            AuthError::EntropyUnavailable
        })?;
        let mixed = hmac_sha256(session_secret, &random);
        Ok(Self(to_base64url(&mixed)))
    }

    /// Accept a token presented by a client
    ///
    /// Anything that is not a 43-character canonical base64url string of
    /// 32 bytes is rejected without touching the store.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() != TOKEN_ENCODED_LEN {
            return None;
        }
        let decoded = from_base64url(raw).ok()?;
        (decoded.len() == TOKEN_ENTROPY_BYTES).then(|| Self(raw.to_string()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Session linkage (`sid`): base64url SHA-256 of the token
    ///
    /// Safe to log and to embed in signed claims; cannot be turned back
    /// into the cookie value.
    pub fn linkage(&self) -> String {
        to_base64url(&sha256(self.0.as_bytes()))
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionToken").field(&"[REDACTED]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_shape() {
        let token = SessionToken::generate(&[7u8; 32]).unwrap();
        assert_eq!(token.as_str().len(), TOKEN_ENCODED_LEN);
        assert!(SessionToken::parse(token.as_str()).is_some());
    }

    #[test]
    fn test_generate_unique() {
        let a = SessionToken::generate(&[7u8; 32]).unwrap();
        let b = SessionToken::generate(&[7u8; 32]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(SessionToken::parse("").is_none());
        assert!(SessionToken::parse("short").is_none());
        assert!(SessionToken::parse(&"!".repeat(TOKEN_ENCODED_LEN)).is_none());
        assert!(SessionToken::parse(&"A".repeat(TOKEN_ENCODED_LEN + 1)).is_none());
    }

    #[test]
    fn test_linkage_is_stable_and_distinct() {
        let token = SessionToken::generate(&[1u8; 32]).unwrap();
        assert_eq!(token.linkage(), token.linkage());
        assert_ne!(token.linkage(), token.as_str());
        assert_eq!(token.linkage().len(), TOKEN_ENCODED_LEN);
    }

    #[test]
    fn test_debug_is_redacted() {
        let token = SessionToken::generate(&[1u8; 32]).unwrap();
        let debug = format!("{:?}", token);
        assert!(!debug.contains(token.as_str()));
        assert!(debug.contains("REDACTED"));
    }
}
