//! Token Issuer
//!
//! Mints and verifies signed session claims: compact JWS strings
//! (`header.payload.signature`, base64url without padding, HS256).
//!
//! Claims are never the source of truth. A valid signature only proves the
//! server once issued the claims; callers must still find a live session
//! whose linkage matches `sid`.
//!
//! ## Key rotation
//! Keys live in a [`SigningKeyRing`]. The first key signs; every key in the
//! ring verifies, selected by the `kid` header. Rotating means prepending a
//! new key and dropping the oldest once its tokens have expired.

use chrono::{DateTime, Utc};
use platform::crypto::{
    from_base64, from_base64url, hmac_sha256, random_bytes, to_base64url, verify_hmac_sha256,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::entity::session::Session;
use crate::error::{AuthError, AuthResult};

const ALG: &str = "HS256";
const TYP: &str = "JWT";

/// Shortest accepted HMAC key
pub const MIN_KEY_LEN: usize = 32;

// ============================================================================
// Keys
// ============================================================================

#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey {
    kid: String,
    secret: Vec<u8>,
}

impl SigningKey {
    pub fn new(kid: impl Into<String>, secret: Vec<u8>) -> Result<Self, KeyRingError> {
        let kid = kid.into();
        if kid.is_empty()
            || !kid
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(KeyRingError::InvalidKid(kid));
        }
        if secret.len() < MIN_KEY_LEN {
            return Err(KeyRingError::KeyTooShort(kid));
        }
        Ok(Self { kid, secret })
    }

    #[inline]
    pub fn kid(&self) -> &str {
        &self.kid
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyRingError {
    #[error("signing key ring is empty")]
    Empty,

    #[error("malformed key ring entry, expected kid:base64key")]
    MalformedEntry,

    #[error("invalid key id: {0:?}")]
    InvalidKid(String),

    #[error("key {0:?} is not valid base64")]
    InvalidBase64(String),

    #[error("key {0:?} is shorter than 32 bytes")]
    KeyTooShort(String),

    #[error("duplicate key id: {0:?}")]
    DuplicateKid(String),
}

/// Ordered set of signing keys, newest first (never empty)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKeyRing {
    keys: Vec<SigningKey>,
}

impl SigningKeyRing {
    pub fn new(current: SigningKey, previous: Vec<SigningKey>) -> Result<Self, KeyRingError> {
        let mut keys = Vec::with_capacity(previous.len() + 1);
        keys.push(current);
        for key in previous {
            if keys.iter().any(|k| k.kid == key.kid) {
                return Err(KeyRingError::DuplicateKid(key.kid));
            }
            keys.push(key);
        }
        Ok(Self { keys })
    }

    /// Parse `kid:base64key,kid:base64key,...` (standard base64)
    pub fn parse(entries: &str) -> Result<Self, KeyRingError> {
        let mut keys = Vec::new();
        for entry in entries.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (kid, encoded) = entry
                .split_once(':')
                .ok_or(KeyRingError::MalformedEntry)?;
            let secret = from_base64(encoded.trim())
                .map_err(|_| KeyRingError::InvalidBase64(kid.to_string()))?;
            keys.push(SigningKey::new(kid.trim(), secret)?);
        }

        let mut keys = keys.into_iter();
        let current = keys.next().ok_or(KeyRingError::Empty)?;
        Self::new(current, keys.collect())
    }

    /// Single random key (development only)
    pub fn random() -> Self {
        let kid = format!("dev-{}", to_base64url(&random_bytes(6)));
        Self {
            keys: vec![SigningKey {
                kid,
                secret: random_bytes(MIN_KEY_LEN),
            }],
        }
    }

    /// All-zero key used by `AuthConfig::default()`
    pub(crate) fn insecure_default() -> Self {
        Self {
            keys: vec![SigningKey {
                kid: "default".to_string(),
                secret: vec![0u8; MIN_KEY_LEN],
            }],
        }
    }

    /// Key used for signing
    pub fn current(&self) -> &SigningKey {
        &self.keys[0]
    }

    pub fn find(&self, kid: &str) -> Option<&SigningKey> {
        self.keys.iter().find(|k| k.kid == kid)
    }

    /// New ring with `key` as current, keeping at most `keep_previous` old keys
    pub fn rotate(&self, key: SigningKey, keep_previous: usize) -> Result<Self, KeyRingError> {
        let previous = self
            .keys
            .iter()
            .filter(|k| k.kid != key.kid)
            .take(keep_previous)
            .cloned()
            .collect();
        Self::new(key, previous)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// ============================================================================
// Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
    kid: String,
}

/// Verified claim set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Expiry (Unix seconds)
    pub exp: i64,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Session linkage, see `SessionToken::linkage`
    pub sid: String,
}

impl Claims {
    pub fn expires_at_ms(&self) -> i64 {
        self.exp.saturating_mul(1000)
    }
}

/// Signed claim blob handed to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedClaims(String);

impl SignedClaims {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_string(self) -> String {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Bad signature, unknown key, wrong algorithm, or malformed blob
    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,
}

// ============================================================================
// Issuer
// ============================================================================

#[derive(Debug, Clone)]
pub struct TokenIssuer {
    keys: SigningKeyRing,
}

impl TokenIssuer {
    pub fn new(keys: SigningKeyRing) -> Self {
        Self { keys }
    }

    /// Sign claims for `session` with the current key
    pub fn issue(&self, session: &Session) -> AuthResult<SignedClaims> {
        let key = self.keys.current();
        let header = Header {
            alg: ALG.to_string(),
            typ: TYP.to_string(),
            kid: key.kid.clone(),
        };
        let claims = Claims {
            exp: session.expires_at.timestamp(),
            iat: session.last_seen_at.timestamp(),
            sid: session.token.linkage(),
        };

        let header_json =
            serde_json::to_vec(&header).map_err(|e| AuthError::Internal(e.to_string()))?;
        let claims_json =
            serde_json::to_vec(&claims).map_err(|e| AuthError::Internal(e.to_string()))?;

        let signing_input = format!("{}.{}", to_base64url(&header_json), to_base64url(&claims_json));
        let signature = hmac_sha256(&key.secret, signing_input.as_bytes());

        Ok(SignedClaims(format!(
            "{}.{}",
            signing_input,
            to_base64url(&signature)
        )))
    }

    /// Verify a signed blob
    ///
    /// The signature is checked before expiry, so a tampered expired token
    /// reports `InvalidSignature`.
    pub fn verify(&self, blob: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut parts = blob.split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::InvalidSignature);
        };

        let header: Header = from_base64url(header_b64)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or(TokenError::InvalidSignature)?;
        if header.alg != ALG {
            return Err(TokenError::InvalidSignature);
        }
        let key = self
            .keys
            .find(&header.kid)
            .ok_or(TokenError::InvalidSignature)?;

        let signature = from_base64url(signature_b64).map_err(|_| TokenError::InvalidSignature)?;
        let signing_input_len = header_b64.len() + 1 + claims_b64.len();
        let signing_input = &blob.as_bytes()[..signing_input_len];
        if !verify_hmac_sha256(&key.secret, signing_input, &signature) {
            return Err(TokenError::InvalidSignature);
        }

        let claims: Claims = from_base64url(claims_b64)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or(TokenError::InvalidSignature)?;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{session_token::SessionToken, user_id::UserId};
    use chrono::Duration;

    fn key(kid: &str, byte: u8) -> SigningKey {
        SigningKey::new(kid, vec![byte; 32]).unwrap()
    }

    fn session(now: DateTime<Utc>) -> Session {
        let token = SessionToken::generate(&[3u8; 32]).unwrap();
        Session::new(token, UserId::new(), now, Duration::hours(1))
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = TokenIssuer::new(SigningKeyRing::new(key("k1", 1), vec![]).unwrap());
        let now = Utc::now();
        let session = session(now);

        let signed = issuer.issue(&session).unwrap();
        assert_eq!(signed.as_str().split('.').count(), 3);

        let claims = issuer.verify(signed.as_str(), now).unwrap();
        assert_eq!(claims.exp, session.expires_at.timestamp());
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.sid, session.token.linkage());
    }

    #[test]
    fn test_expired() {
        let issuer = TokenIssuer::new(SigningKeyRing::random());
        let now = Utc::now();
        let signed = issuer.issue(&session(now)).unwrap();
        assert_eq!(
            issuer.verify(signed.as_str(), now + Duration::hours(2)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_tampered_expired_token_is_invalid_signature() {
        let issuer = TokenIssuer::new(SigningKeyRing::random());
        let now = Utc::now();
        let signed = issuer.issue(&session(now)).unwrap().into_string();
        let mut bytes = signed.into_bytes();
        let last = bytes.len() - 1;
        bytes[last] = if bytes[last] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();
        assert_eq!(
            issuer.verify(&tampered, now + Duration::hours(2)),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_malformed_blobs() {
        let issuer = TokenIssuer::new(SigningKeyRing::random());
        let now = Utc::now();
        for blob in ["", "a", "a.b", "a.b.c", "a.b.c.d", "...", "%%.%%.%%"] {
            assert_eq!(issuer.verify(blob, now), Err(TokenError::InvalidSignature));
        }
    }

    #[test]
    fn test_wrong_alg_rejected() {
        let issuer = TokenIssuer::new(SigningKeyRing::new(key("k1", 1), vec![]).unwrap());
        let now = Utc::now();
        let signed = issuer.issue(&session(now)).unwrap().into_string();
        let (_, rest) = signed.split_once('.').unwrap();
        let none_header = to_base64url(br#"{"alg":"none","typ":"JWT","kid":"k1"}"#);
        let forged = format!("{}.{}", none_header, rest);
        assert_eq!(
            issuer.verify(&forged, now),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_rotation_keeps_old_tokens_valid() {
        let old_ring = SigningKeyRing::new(key("old", 1), vec![]).unwrap();
        let old_issuer = TokenIssuer::new(old_ring.clone());
        let now = Utc::now();
        let old_token = old_issuer.issue(&session(now)).unwrap();

        let new_ring = old_ring.rotate(key("new", 2), 1).unwrap();
        assert_eq!(new_ring.current().kid(), "new");
        let new_issuer = TokenIssuer::new(new_ring.clone());
        assert!(new_issuer.verify(old_token.as_str(), now).is_ok());

        let new_token = new_issuer.issue(&session(now)).unwrap();
        assert!(!new_token.as_str().is_empty());
        assert_eq!(
            old_issuer.verify(new_token.as_str(), now),
            Err(TokenError::InvalidSignature)
        );

        // Drop the old key entirely
        let retired = new_ring.rotate(key("newer", 3), 0).unwrap();
        assert_eq!(retired.len(), 1);
        assert_eq!(
            TokenIssuer::new(retired).verify(old_token.as_str(), now),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_parse_key_ring() {
        let k1 = platform::crypto::to_base64(&[1u8; 32]);
        let k2 = platform::crypto::to_base64(&[2u8; 48]);
        let ring = SigningKeyRing::parse(&format!("2025-06:{k1}, 2025-01:{k2}")).unwrap();
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.current().kid(), "2025-06");
        assert!(ring.find("2025-01").is_some());
    }

    #[test]
    fn test_parse_key_ring_errors() {
        let good = platform::crypto::to_base64(&[1u8; 32]);
        let short = platform::crypto::to_base64(&[1u8; 16]);
        assert_eq!(SigningKeyRing::parse(""), Err(KeyRingError::Empty));
        assert_eq!(
            SigningKeyRing::parse("nokey"),
            Err(KeyRingError::MalformedEntry)
        );
        assert_eq!(
            SigningKeyRing::parse("k:!!!"),
            Err(KeyRingError::InvalidBase64("k".into()))
        );
        assert_eq!(
            SigningKeyRing::parse(&format!("k:{short}")),
            Err(KeyRingError::KeyTooShort("k".into()))
        );
        assert_eq!(
            SigningKeyRing::parse(&format!("k:{good},k:{good}")),
            Err(KeyRingError::DuplicateKid("k".into()))
        );
        assert_eq!(
            SigningKeyRing::parse(&format!("bad kid:{good}")),
            Err(KeyRingError::InvalidKid("bad kid".into()))
        );
    }

    #[test]
    fn test_debug_hides_secret() {
        let debug = format!("{:?}", key("k1", 0xAB));
        assert!(debug.contains("k1"));
        assert!(debug.contains("REDACTED"));
    }
}
