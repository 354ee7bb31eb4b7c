//! Domain Services

use platform::password::{ClearTextPassword, PasswordCheck};

/// Checks a plaintext password against a stored one-way hash
///
/// Implementations are CPU-bound and blocking; callers run them off the
/// async executor.
pub trait PasswordVerifier: Send + Sync + 'static {
    fn verify(&self, password: &ClearTextPassword, stored_hash: &str) -> PasswordCheck;

    /// Burn the cost of one verification without a real hash
    ///
    /// Used when the identifier is unknown so that path takes as long as a
    /// wrong password.
    fn verify_dummy(&self, password: &ClearTextPassword);
}
