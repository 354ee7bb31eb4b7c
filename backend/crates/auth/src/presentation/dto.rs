//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

// ============================================================================
// Login
// ============================================================================

/// Login request
///
/// `email` is accepted as an alias for `identifier`. No `Debug`: the body
/// carries a plaintext password.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// User name or email
    #[serde(alias = "email")]
    pub identifier: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Signed session claims
    pub token: String,
    pub expires_at_ms: i64,
}

// ============================================================================
// Session Status
// ============================================================================

/// Validate response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub status: &'static str,
    pub expires_at_ms: i64,
}

/// Bearer token check response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatusResponse {
    pub valid: bool,
    pub expires_at_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_accepts_email_alias() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"email":"a@b.com","password":"correct"}"#).unwrap();
        assert_eq!(req.identifier, "a@b.com");

        let req: LoginRequest =
            serde_json::from_str(r#"{"identifier":"bob","password":"pw"}"#).unwrap();
        assert_eq!(req.identifier, "bob");
    }

    #[test]
    fn test_login_request_requires_password() {
        assert!(serde_json::from_str::<LoginRequest>(r#"{"identifier":"bob"}"#).is_err());
    }

    #[test]
    fn test_responses_are_camel_case() {
        let json = serde_json::to_value(LoginResponse {
            token: "t".into(),
            expires_at_ms: 5,
        })
        .unwrap();
        assert_eq!(json["expiresAtMs"], 5);

        let json = serde_json::to_value(SessionStatusResponse {
            status: "ok",
            expires_at_ms: 7,
        })
        .unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["expiresAtMs"], 7);
    }
}
