//! PostgreSQL Repository Implementations

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::domain::entity::{session::Session, user_record::UserRecord};
use crate::domain::repository::{CredentialStore, SessionLookup, SessionStore};
use crate::domain::value_object::{
    identifier::Identifier, session_token::SessionToken, user_id::UserId,
};
use crate::error::{AuthError, AuthResult};

/// Attempts at drawing a token that is not already taken
const CREATE_ATTEMPTS: usize = 3;

const UPSERT_USER: &str = r#"
    INSERT INTO users (user_id, identifier, password_hash)
    VALUES ($1, $2, $3)
    ON CONFLICT (identifier) DO UPDATE SET password_hash = EXCLUDED.password_hash
    RETURNING user_id
"#;

/// PostgreSQL-backed credential and session store
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
    ttl: Duration,
    secret: [u8; 32],
}

impl PgAuthRepository {
    pub fn new(pool: PgPool, config: &AuthConfig) -> Self {
        Self {
            pool,
            ttl: config.session_ttl(),
            secret: config.session_secret,
        }
    }

    /// Insert a user, or replace the password of an existing identifier
    ///
    /// Returns the stored `user_id`, which is the existing row's when the
    /// identifier was already taken.
    pub async fn insert_user(&self, record: &UserRecord) -> AuthResult<UserId> {
        let user_id: Uuid = sqlx::query_scalar(UPSERT_USER)
            .bind(record.user_id.as_uuid())
            .bind(record.identifier.as_str())
            .bind(&record.password_hash)
            .fetch_one(&self.pool)
            .await?;

        Ok(UserId::from_uuid(user_id))
    }

    async fn delete_if_expired(&self, token: &SessionToken, now: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE token = $1 AND expires_at <= $2")
            .bind(token.as_str())
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for PgAuthRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgAuthRepository")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Credential Store Implementation
// ============================================================================

impl CredentialStore for PgAuthRepository {
    async fn lookup(&self, identifier: &Identifier) -> AuthResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, identifier, password_hash
            FROM users
            WHERE identifier = $1
            "#,
        )
        .bind(identifier.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_record).transpose()
    }
}

// ============================================================================
// Session Store Implementation
// ============================================================================

impl SessionStore for PgAuthRepository {
    async fn create(&self, user_id: &UserId, now: DateTime<Utc>) -> AuthResult<Session> {
        for _ in 0..CREATE_ATTEMPTS {
            let token = SessionToken::generate(&self.secret)?;
            let session = Session::new(token, *user_id, now, self.ttl);

            let inserted = sqlx::query(
                r#"
                INSERT INTO auth_sessions (token, user_id, created_at, expires_at, last_seen_at)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (token) DO NOTHING
                "#,
            )
            .bind(session.token.as_str())
            .bind(session.user_id.as_uuid())
            .bind(session.created_at)
            .bind(session.expires_at)
            .bind(session.last_seen_at)
            .execute(&self.pool)
            .await?
            .rows_affected();

            if inserted == 1 {
                return Ok(session);
            }
            tracing::warn!("Session token collision, drawing again");
        }

        Err(AuthError::Internal(
            "could not allocate a unique session token".to_string(),
        ))
    }

    async fn lookup(&self, token: &SessionToken, now: DateTime<Utc>) -> AuthResult<SessionLookup> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT token, user_id, created_at, expires_at, last_seen_at
            FROM auth_sessions
            WHERE token = $1
            "#,
        )
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(SessionLookup::NotFound);
        };
        let session = row.into_session()?;

        if session.is_live_at(now) {
            Ok(SessionLookup::Live(session))
        } else {
            self.delete_if_expired(token, now).await?;
            Ok(SessionLookup::Expired)
        }
    }

    async fn extend(
        &self,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Session>> {
        // Row lock serializes concurrent extends; GREATEST keeps both timestamps monotonic
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            UPDATE auth_sessions
            SET last_seen_at = GREATEST(last_seen_at, $2),
                expires_at = GREATEST(expires_at, $3)
            WHERE token = $1 AND expires_at > $2
            RETURNING token, user_id, created_at, expires_at, last_seen_at
            "#,
        )
        .bind(token.as_str())
        .bind(now)
        .bind(now + self.ttl)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.into_session().map(Some),
            None => {
                self.delete_if_expired(token, now).await?;
                Ok(None)
            }
        }
    }

    async fn invalidate(&self, token: &SessionToken) -> AuthResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE token = $1")
            .bind(token.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    identifier: String,
    password_hash: String,
}

impl UserRow {
    fn into_record(self) -> AuthResult<UserRecord> {
        let identifier = Identifier::new(&self.identifier)
            .map_err(|e| AuthError::Internal(format!("stored identifier rejected: {e}")))?;
        Ok(UserRecord::new(
            UserId::from_uuid(self.user_id),
            identifier,
            self.password_hash,
        ))
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    token: String,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    last_seen_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> AuthResult<Session> {
        let token = SessionToken::parse(&self.token)
            .ok_or_else(|| AuthError::Internal("stored session token is malformed".to_string()))?;
        Ok(Session {
            token,
            user_id: UserId::from_uuid(self.user_id),
            created_at: self.created_at,
            expires_at: self.expires_at,
            last_seen_at: self.last_seen_at,
        })
    }
}
