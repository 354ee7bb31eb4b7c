//! Session Manager
//!
//! Orchestrates the credential store, password verifier, session store and
//! token issuer. Failures are never retried; they surface to the caller.
//!
//! ## Validate flow
//! no cookie → unauthenticated; otherwise look the token up, and when it is
//! live slide its expiry and hand back the refreshed session.
//!
//! ## Login flow
//! non-POST → `MethodNotAllowed`; unknown identifier and wrong password both
//! → `InvalidCredentials` after the same amount of hashing work; success →
//! new session plus signed claims.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use http::Method;
use platform::crypto::constant_time_eq;
use platform::password::{ClearTextPassword, PasswordCheck};

use crate::application::capability::{
    CredentialAuthenticator, LoginOutput, SessionValidator, UnauthenticatedReason, Validation,
};
use crate::application::token_issuer::{TokenError, TokenIssuer};
use crate::domain::entity::session::Session;
use crate::domain::repository::{CredentialStore, SessionLookup, SessionStore};
use crate::domain::services::PasswordVerifier;
use crate::domain::value_object::{
    credentials::Credentials, identifier::Identifier, session_token::SessionToken,
};
use crate::error::{AuthError, AuthResult};

/// Reject anything but POST at the login endpoint
pub fn ensure_login_method(method: &Method) -> AuthResult<()> {
    if *method == Method::POST {
        Ok(())
    } else {
        Err(AuthError::MethodNotAllowed)
    }
}

pub struct SessionManager<C, S>
where
    C: CredentialStore,
    S: SessionStore,
{
    credentials: Arc<C>,
    sessions: Arc<S>,
    verifier: Arc<dyn PasswordVerifier>,
    issuer: Arc<TokenIssuer>,
}

impl<C, S> Clone for SessionManager<C, S>
where
    C: CredentialStore,
    S: SessionStore,
{
    fn clone(&self) -> Self {
        Self {
            credentials: Arc::clone(&self.credentials),
            sessions: Arc::clone(&self.sessions),
            verifier: Arc::clone(&self.verifier),
            issuer: Arc::clone(&self.issuer),
        }
    }
}

impl<C, S> SessionManager<C, S>
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    pub fn new(
        credentials: Arc<C>,
        sessions: Arc<S>,
        verifier: Arc<dyn PasswordVerifier>,
        issuer: TokenIssuer,
    ) -> Self {
        Self {
            credentials,
            sessions,
            verifier,
            issuer: Arc::new(issuer),
        }
    }

    pub fn sessions(&self) -> &Arc<S> {
        &self.sessions
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Run the verifier on the blocking pool
    ///
    /// With no stored hash the verifier does a dummy round instead and the
    /// result is `None`.
    async fn check_password(
        &self,
        password: ClearTextPassword,
        stored_hash: Option<String>,
    ) -> AuthResult<Option<PasswordCheck>> {
        let verifier = Arc::clone(&self.verifier);
        tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => Some(verifier.verify(&password, &hash)),
            None => {
                verifier.verify_dummy(&password);
                None
            }
        })
        .await
        .map_err(|e| AuthError::Internal(format!("password verification task failed: {e}")))
    }

    /// Remove a session the client never received; true when it is gone
    pub(crate) async fn discard_session(&self, session: &Session) -> bool {
        match self.sessions.invalidate(&session.token).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    sid = %session.token.linkage(),
                    "Failed to discard orphaned session"
                );
                false
            }
        }
    }

    async fn resolve_cookie(
        &self,
        cookie: Option<&str>,
        now: DateTime<Utc>,
    ) -> AuthResult<Result<SessionToken, UnauthenticatedReason>> {
        let Some(raw) = cookie else {
            return Ok(Err(UnauthenticatedReason::NoCookie));
        };
        let Some(token) = SessionToken::parse(raw) else {
            tracing::debug!("Malformed session cookie");
            return Ok(Err(UnauthenticatedReason::MalformedCookie));
        };
        match self.sessions.lookup(&token, now).await? {
            SessionLookup::Live(_) => Ok(Ok(token)),
            SessionLookup::Expired => {
                tracing::debug!(sid = %token.linkage(), "Session expired");
                Ok(Err(UnauthenticatedReason::Expired))
            }
            SessionLookup::NotFound => Ok(Err(UnauthenticatedReason::NotFound)),
        }
    }
}

impl<C, S> CredentialAuthenticator for SessionManager<C, S>
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    async fn login(
        &self,
        method: &Method,
        credentials: Credentials,
        now: DateTime<Utc>,
    ) -> AuthResult<LoginOutput> {
        ensure_login_method(method)?;

        let Credentials {
            identifier,
            password,
        } = credentials;

        let record = match Identifier::new(&identifier) {
            Ok(identifier) => self.credentials.lookup(&identifier).await?,
            Err(_) => None,
        };

        let stored_hash = record.as_ref().map(|r| r.password_hash.clone());
        let check = self.check_password(password, stored_hash).await?;

        let record = match (record, check) {
            (Some(record), Some(PasswordCheck::Match)) => record,
            (Some(record), Some(PasswordCheck::MalformedHash)) => {
                tracing::error!(user_id = %record.user_id, "Stored password hash is unreadable");
                return Err(AuthError::MalformedHash);
            }
            (Some(record), _) => {
                tracing::info!(user_id = %record.user_id, "Password mismatch");
                return Err(AuthError::InvalidCredentials);
            }
            (None, _) => {
                tracing::info!("Login for unknown identifier");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let session = self.sessions.create(&record.user_id, now).await?;

        let token = match self.issuer.issue(&session) {
            Ok(token) => token,
            Err(e) => {
                // Do not leave a session behind that the client never learned about
                self.discard_session(&session).await;
                return Err(e);
            }
        };

        tracing::info!(
            user_id = %record.user_id,
            sid = %session.token.linkage(),
            expires_at = %session.expires_at,
            "User logged in"
        );

        Ok(LoginOutput { session, token })
    }
}

impl<C, S> SessionValidator for SessionManager<C, S>
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    async fn validate(&self, cookie: Option<&str>, now: DateTime<Utc>) -> AuthResult<Validation> {
        let token = match self.resolve_cookie(cookie, now).await? {
            Ok(token) => token,
            Err(reason) => return Ok(Validation::Unauthenticated(reason)),
        };

        match self.sessions.extend(&token, now).await? {
            Some(session) => {
                tracing::debug!(
                    sid = %token.linkage(),
                    expires_at = %session.expires_at,
                    "Session extended"
                );
                Ok(Validation::Authenticated(session))
            }
            // Expired or logged out between lookup and extend
            None => Ok(Validation::Unauthenticated(UnauthenticatedReason::NotFound)),
        }
    }

    async fn logout(&self, cookie: Option<&str>) -> AuthResult<()> {
        let Some(token) = cookie.and_then(SessionToken::parse) else {
            return Ok(());
        };
        self.sessions.invalidate(&token).await?;
        tracing::info!(sid = %token.linkage(), "User logged out");
        Ok(())
    }

    async fn verify_bearer(
        &self,
        signed_token: &str,
        cookie: Option<&str>,
        now: DateTime<Utc>,
    ) -> AuthResult<Validation> {
        let claims = match self.issuer.verify(signed_token, now) {
            Ok(claims) => claims,
            Err(TokenError::Expired) => {
                return Ok(Validation::Unauthenticated(
                    UnauthenticatedReason::TokenExpired,
                ));
            }
            Err(TokenError::InvalidSignature) => {
                tracing::warn!("Bearer token failed signature check");
                return Ok(Validation::Unauthenticated(
                    UnauthenticatedReason::InvalidToken,
                ));
            }
        };

        let Some(token) = cookie.and_then(SessionToken::parse) else {
            return Ok(Validation::Unauthenticated(UnauthenticatedReason::NoCookie));
        };

        let session = match self.sessions.lookup(&token, now).await? {
            SessionLookup::Live(session) => session,
            SessionLookup::Expired => {
                return Ok(Validation::Unauthenticated(UnauthenticatedReason::Expired));
            }
            SessionLookup::NotFound => {
                return Ok(Validation::Unauthenticated(UnauthenticatedReason::NotFound));
            }
        };

        if !constant_time_eq(claims.sid.as_bytes(), session.token.linkage().as_bytes()) {
            tracing::warn!(sid = %session.token.linkage(), "Bearer token belongs to another session");
            return Ok(Validation::Unauthenticated(
                UnauthenticatedReason::LinkageMismatch,
            ));
        }

        Ok(Validation::Authenticated(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_method() {
        assert!(ensure_login_method(&Method::POST).is_ok());
        for method in [Method::GET, Method::PUT, Method::DELETE, Method::HEAD] {
            assert!(matches!(
                ensure_login_method(&method),
                Err(AuthError::MethodNotAllowed)
            ));
        }
    }
}
