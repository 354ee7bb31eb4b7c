//! Session Entity
//!
//! Server-side record of an authenticated login. A session is *live* while
//! `now < expires_at` and *expired* from `expires_at` on.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::{session_token::SessionToken, user_id::UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: SessionToken,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl Session {
    /// Create a fresh session
    ///
    /// TTL is provided by the application layer (config), not hard-coded here.
    pub fn new(token: SessionToken, user_id: UserId, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            token,
            user_id,
            created_at: now,
            expires_at: now + ttl,
            last_seen_at: now,
        }
    }

    #[inline]
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    #[inline]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_live_at(now)
    }

    /// Slide expiry to `now + ttl`
    ///
    /// Neither timestamp ever moves backwards, so a delayed request with an
    /// older `now` cannot shorten a session another request just extended.
    pub fn extend(&mut self, now: DateTime<Utc>, ttl: Duration) {
        self.last_seen_at = self.last_seen_at.max(now);
        self.expires_at = self.expires_at.max(now + ttl);
    }

    /// Whole seconds until expiry, clamped at zero (cookie `Max-Age`)
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }

    #[inline]
    pub fn expires_at_ms(&self) -> i64 {
        self.expires_at.timestamp_millis()
    }
}
