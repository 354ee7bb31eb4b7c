//! Argon2id Password Verifier

use argon2::Argon2;
use platform::crypto::{random_bytes, to_base64url};
use platform::password::{ClearTextPassword, PasswordCheck, check_password};

use crate::domain::services::PasswordVerifier;
use crate::error::{AuthError, AuthResult};

/// Argon2id hashing and verification with an optional pepper
///
/// Verification takes its cost parameters from the stored PHC string; the
/// configured `Argon2` instance is used for new hashes and for the dummy
/// hash behind [`PasswordVerifier::verify_dummy`].
pub struct Argon2PasswordVerifier {
    argon2: Argon2<'static>,
    pepper: Option<Vec<u8>>,
    dummy_hash: Option<String>,
}

impl Argon2PasswordVerifier {
    /// OWASP default parameters (m=19456 KiB, t=2, p=1)
    pub fn new(pepper: Option<Vec<u8>>) -> Self {
        Self::with_argon2(Argon2::default(), pepper)
    }

    /// The dummy hash is computed here, so the first unknown-identifier
    /// login costs the same as every later one
    pub fn with_argon2(argon2: Argon2<'static>, pepper: Option<Vec<u8>>) -> Self {
        let mut verifier = Self {
            argon2,
            pepper,
            dummy_hash: None,
        };
        let filler = ClearTextPassword::for_login(to_base64url(&random_bytes(24)));
        verifier.dummy_hash = match verifier.hash(&filler) {
            Ok(hash) => Some(hash),
            Err(e) => {
                tracing::error!(error = %e, "Could not build dummy password hash");
                None
            }
        };
        verifier
    }

    /// Hash a password for storage (PHC string)
    pub fn hash(&self, password: &ClearTextPassword) -> AuthResult<String> {
        password
            .hash_with(&self.argon2, self.pepper.as_deref())
            .map(|hashed| hashed.as_phc_string().to_string())
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    fn dummy_hash(&self) -> Option<&str> {
        self.dummy_hash.as_deref()
    }
}

impl PasswordVerifier for Argon2PasswordVerifier {
    fn verify(&self, password: &ClearTextPassword, stored_hash: &str) -> PasswordCheck {
        check_password(password, stored_hash, self.pepper.as_deref())
    }

    fn verify_dummy(&self, password: &ClearTextPassword) {
        if let Some(hash) = self.dummy_hash() {
            let _ = check_password(password, hash, self.pepper.as_deref());
        }
    }
}

impl std::fmt::Debug for Argon2PasswordVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2PasswordVerifier")
            .field("peppered", &self.pepper.is_some())
            .finish_non_exhaustive()
    }
}
