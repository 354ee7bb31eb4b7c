//! UserId Value Object
//!
//! Stable, unique user identity. Assigned by the user store and never
//! derived from the login identifier.

pub use kernel::id::{UserId, markers::User as UserMarker};
