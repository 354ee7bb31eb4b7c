//! Application Layer
//!
//! Session orchestration, signed claims and configuration.

pub mod capability;
pub mod config;
pub mod session_manager;
pub mod token_issuer;

// Re-exports
pub use capability::{
    CredentialAuthenticator, LoginOutput, SessionValidator, UnauthenticatedReason, Validation,
};
pub use config::AuthConfig;
pub use session_manager::{SessionManager, ensure_login_method};
pub use token_issuer::{Claims, SignedClaims, SigningKey, SigningKeyRing, TokenError, TokenIssuer};
