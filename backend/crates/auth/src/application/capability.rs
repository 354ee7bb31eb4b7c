//! Capability Traits
//!
//! What handlers and middleware may ask of the session layer. Routes are
//! generic over these, so tests and alternative backends plug in without a
//! database.

use chrono::{DateTime, Utc};
use http::Method;

use crate::application::token_issuer::SignedClaims;
use crate::domain::entity::session::Session;
use crate::domain::value_object::credentials::Credentials;
use crate::error::AuthResult;

/// Why a request is not authenticated
///
/// Only logs and tests see the difference; every variant is the same 401
/// on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthenticatedReason {
    NoCookie,
    MalformedCookie,
    Expired,
    NotFound,
    InvalidToken,
    TokenExpired,
    /// Signed claims do not belong to the cookie's session
    LinkageMismatch,
}

/// Outcome of checking a request's session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Authenticated(Session),
    Unauthenticated(UnauthenticatedReason),
}

impl Validation {
    pub fn session(&self) -> Option<&Session> {
        match self {
            Validation::Authenticated(session) => Some(session),
            Validation::Unauthenticated(_) => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Validation::Authenticated(_))
    }
}

/// Successful login
#[derive(Debug, Clone)]
pub struct LoginOutput {
    pub session: Session,
    pub token: SignedClaims,
}

/// Session checks and teardown
#[trait_variant::make(SessionValidator: Send)]
pub trait LocalSessionValidator {
    /// Resolve the session cookie, sliding its expiry when live
    async fn validate(&self, cookie: Option<&str>, now: DateTime<Utc>) -> AuthResult<Validation>;

    /// Invalidate the cookie's session if there is one
    async fn logout(&self, cookie: Option<&str>) -> AuthResult<()>;

    /// Check signed claims against the cookie's live session (read-only)
    async fn verify_bearer(
        &self,
        signed_token: &str,
        cookie: Option<&str>,
        now: DateTime<Utc>,
    ) -> AuthResult<Validation>;
}

/// Credential login
#[trait_variant::make(CredentialAuthenticator: Send)]
pub trait LocalCredentialAuthenticator {
    async fn login(
        &self,
        method: &Method,
        credentials: Credentials,
        now: DateTime<Utc>,
    ) -> AuthResult<LoginOutput>;
}
