//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the infra layer.

use chrono::{DateTime, Utc};

use crate::domain::entity::{session::Session, user_record::UserRecord};
use crate::domain::value_object::{
    identifier::Identifier, session_token::SessionToken, user_id::UserId,
};
use crate::error::AuthResult;

/// Result of resolving a session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLookup {
    Live(Session),
    /// The record existed but had expired; it has now been removed
    Expired,
    NotFound,
}

/// Credential store trait
///
/// Storage failures surface as `AuthError::StoreUnavailable`, never as
/// `Ok(None)`.
#[trait_variant::make(CredentialStore: Send)]
pub trait LocalCredentialStore {
    /// Find a user by (normalized) identifier
    async fn lookup(&self, identifier: &Identifier) -> AuthResult<Option<UserRecord>>;
}

/// Session store trait
#[trait_variant::make(SessionStore: Send)]
pub trait LocalSessionStore {
    /// Create a session for `user_id` with a fresh token
    async fn create(&self, user_id: &UserId, now: DateTime<Utc>) -> AuthResult<Session>;

    /// Resolve a token; expired records are removed when observed
    async fn lookup(&self, token: &SessionToken, now: DateTime<Utc>) -> AuthResult<SessionLookup>;

    /// Slide a live session's expiry; `None` if it is gone or expired
    async fn extend(&self, token: &SessionToken, now: DateTime<Utc>)
    -> AuthResult<Option<Session>>;

    /// Remove a session (idempotent)
    async fn invalidate(&self, token: &SessionToken) -> AuthResult<()>;

    /// Remove every expired session, returning how many were removed
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64>;
}
