//! In-Memory Stores
//!
//! Process-local credential and session stores on `DashMap`. Sessions are
//! sharded, so requests for different tokens rarely share a lock and every
//! read-modify-write on one token happens under that entry's write guard.
//! Sessions do not survive a restart.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::application::config::AuthConfig;
use crate::domain::entity::{session::Session, user_record::UserRecord};
use crate::domain::repository::{CredentialStore, SessionLookup, SessionStore};
use crate::domain::value_object::{
    identifier::Identifier, session_token::SessionToken, user_id::UserId,
};
use crate::error::{AuthError, AuthResult};
use crate::infra::password_verifier::Argon2PasswordVerifier;
use platform::password::ClearTextPassword;

// ============================================================================
// Credential Store
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    users: Arc<DashMap<Identifier, UserRecord>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user, returning the previous record for that identifier
    pub fn insert(&self, record: UserRecord) -> Option<UserRecord> {
        self.users.insert(record.identifier.clone(), record)
    }

    /// Register a user under the registration password policy
    ///
    /// Hashing runs on the calling thread; call it at startup or from
    /// `spawn_blocking`.
    pub fn register(
        &self,
        identifier: &str,
        password: String,
        verifier: &Argon2PasswordVerifier,
    ) -> AuthResult<UserRecord> {
        let identifier = Identifier::new(identifier)?;
        let password = ClearTextPassword::new(password)
            .map_err(|e| AuthError::BadRequest(e.to_string()))?;
        let hash = verifier.hash(&password)?;

        let record = UserRecord::new(UserId::new(), identifier, hash);
        self.insert(record.clone());
        tracing::info!(user_id = %record.user_id, "User registered");
        Ok(record)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    async fn lookup(&self, identifier: &Identifier) -> AuthResult<Option<UserRecord>> {
        Ok(self.users.get(identifier).map(|entry| entry.value().clone()))
    }
}

// ============================================================================
// Session Store
// ============================================================================

#[derive(Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<DashMap<SessionToken, Session>>,
    ttl: Duration,
    secret: Arc<[u8; 32]>,
}

enum ExtendOutcome {
    Extended(Session),
    Expired,
    Missing,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration, secret: [u8; 32]) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            ttl,
            secret: Arc::new(secret),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.session_ttl(), config.session_secret)
    }

    /// Number of stored records, live or not yet reaped
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn remove_if_expired(&self, token: &SessionToken, now: DateTime<Utc>) {
        self.sessions
            .remove_if(token, |_, session| session.is_expired_at(now));
    }
}

impl std::fmt::Debug for InMemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySessionStore")
            .field("sessions", &self.sessions.len())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionStore for InMemorySessionStore {
    async fn create(&self, user_id: &UserId, now: DateTime<Utc>) -> AuthResult<Session> {
        loop {
            let token = SessionToken::generate(self.secret.as_slice())?;
            // 256-bit tokens; a collision means a broken RNG, so just draw again
            if let Entry::Vacant(slot) = self.sessions.entry(token.clone()) {
                let session = Session::new(token, *user_id, now, self.ttl);
                slot.insert(session.clone());
                return Ok(session);
            }
        }
    }

    async fn lookup(&self, token: &SessionToken, now: DateTime<Utc>) -> AuthResult<SessionLookup> {
        match self.sessions.get(token) {
            None => return Ok(SessionLookup::NotFound),
            Some(entry) if entry.is_live_at(now) => {
                return Ok(SessionLookup::Live(entry.value().clone()));
            }
            Some(_) => {}
        }

        // Read guard is dropped; removal takes the shard's write lock
        self.remove_if_expired(token, now);
        Ok(SessionLookup::Expired)
    }

    async fn extend(
        &self,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Session>> {
        let outcome = match self.sessions.get_mut(token) {
            None => ExtendOutcome::Missing,
            Some(entry) if entry.is_expired_at(now) => ExtendOutcome::Expired,
            Some(mut entry) => {
                entry.extend(now, self.ttl);
                ExtendOutcome::Extended(entry.value().clone())
            }
        };

        match outcome {
            ExtendOutcome::Extended(session) => Ok(Some(session)),
            ExtendOutcome::Expired => {
                self.remove_if_expired(token, now);
                Ok(None)
            }
            ExtendOutcome::Missing => Ok(None),
        }
    }

    async fn invalidate(&self, token: &SessionToken) -> AuthResult<()> {
        self.sessions.remove(token);
        Ok(())
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut removed = 0u64;
        self.sessions.retain(|_, session| {
            let keep = session.is_live_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}
