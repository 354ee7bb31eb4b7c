//! Identifier Value Object
//!
//! The name a user logs in with: either a username or an email address.
//!
//! ## Normalization
//! - surrounding whitespace is trimmed
//! - identifiers containing `@` are emails and are ASCII-lowercased
//! - usernames are kept exactly as typed (case-sensitive)
//!
//! ```rust
//! use auth::domain::value_object::identifier::Identifier;
//!
//! let email = Identifier::new("  Alice@Example.COM ").unwrap();
//! assert_eq!(email.as_str(), "alice@example.com");
//!
//! let user = Identifier::new("Alice").unwrap();
//! assert_eq!(user.as_str(), "Alice");
//! ```

use std::str::FromStr;

use derive_more::Display;
use kernel::error::app_error::{AppError, AppResult};

/// Longest accepted identifier (RFC 5321 path limit)
pub const MAX_IDENTIFIER_LEN: usize = 254;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct Identifier(String);

impl Identifier {
    pub fn new(raw: &str) -> AppResult<Self> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(AppError::bad_request("Identifier must not be empty"));
        }
        if trimmed.chars().count() > MAX_IDENTIFIER_LEN {
            return Err(AppError::bad_request("Identifier is too long"));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(AppError::bad_request("Identifier contains control characters"));
        }

        let normalized = if trimmed.contains('@') {
            trimmed.to_ascii_lowercase()
        } else {
            trimmed.to_string()
        };

        Ok(Self(normalized))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_email(&self) -> bool {
        self.0.contains('@')
    }

    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FromStr for Identifier {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        Identifier::new(s)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
