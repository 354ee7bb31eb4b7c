//! Value Object Module

pub mod credentials;
pub mod identifier;
pub mod session_token;
pub mod user_id;
