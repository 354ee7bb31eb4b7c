//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, store traits, password verifier trait
//! - `application/` - Session manager, token issuer, configuration
//! - `infra/` - In-memory and PostgreSQL stores, Argon2id, session reaper
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Login with username or email + password
//! - Server-side sessions in an opaque cookie, with sliding expiry
//! - Signed session claims (HS256, rotating key ring) bound to the session
//! - `require_session` middleware for protected routes
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, verified off the async executor
//! - Unknown identifiers cost the same as wrong passwords and get the same 401
//! - Session tokens: 256 bits of OS randomness keyed by a server secret
//! - Tokens never appear in logs; only their SHA-256 linkage does

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::{
    CredentialAuthenticator, SessionManager, SessionValidator, SigningKeyRing, TokenIssuer,
    Validation,
};
pub use error::{AuthError, AuthResult};
pub use infra::{
    Argon2PasswordVerifier, InMemoryCredentialStore, InMemorySessionStore, PgAuthRepository,
    spawn_session_reaper,
};
pub use presentation::router::{auth_router, protect};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
