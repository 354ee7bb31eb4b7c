//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations, free of any domain vocabulary:
//! - Cryptographic utilities (OS randomness, SHA-256, HMAC-SHA256, Base64)
//! - Password hashing and verification (Argon2id)
//! - Cookie building and extraction

pub mod cookie;
pub mod crypto;
pub mod password;
