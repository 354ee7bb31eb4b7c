//! Credentials Value Object
//!
//! Identifier and plaintext password as submitted by a login request.
//! Transient: never stored, and the password is wiped when dropped.

use platform::password::ClearTextPassword;

#[derive(Debug)]
pub struct Credentials {
    /// Raw identifier; normalized later through `Identifier`
    pub identifier: String,
    pub password: ClearTextPassword,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: ClearTextPassword::for_login(password.into()),
        }
    }
}
