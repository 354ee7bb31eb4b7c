//! Infrastructure Layer
//!
//! Store implementations, password hashing and background tasks.

pub mod memory;
pub mod password_verifier;
pub mod postgres;
pub mod reaper;

pub use memory::{InMemoryCredentialStore, InMemorySessionStore};
pub use password_verifier::Argon2PasswordVerifier;
pub use postgres::PgAuthRepository;
pub use reaper::spawn_session_reaper;
