//! User Record Entity
//!
//! What the credential store knows about a user. Read-only from the auth core.

use crate::domain::value_object::{identifier::Identifier, user_id::UserId};

#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: UserId,
    pub identifier: Identifier,
    /// Argon2id PHC string
    pub password_hash: String,
}

impl UserRecord {
    pub fn new(user_id: UserId, identifier: Identifier, password_hash: impl Into<String>) -> Self {
        Self {
            user_id,
            identifier,
            password_hash: password_hash.into(),
        }
    }
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("user_id", &self.user_id)
            .field("identifier", &self.identifier)
            .field("password_hash", &"[HASH]")
            .finish()
    }
}
