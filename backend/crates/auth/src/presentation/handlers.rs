//! HTTP Handlers

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::application::capability::{CredentialAuthenticator, SessionValidator, Validation};
use crate::application::config::AuthConfig;
use crate::application::session_manager::ensure_login_method;
use crate::domain::entity::session::Session;
use crate::domain::value_object::credentials::Credentials;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    LoginRequest, LoginResponse, SessionStatusResponse, TokenStatusResponse,
};

/// Shared state for auth handlers
pub struct AuthAppState<M> {
    pub manager: Arc<M>,
    pub config: Arc<AuthConfig>,
}

impl<M> Clone for AuthAppState<M> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
            config: Arc::clone(&self.config),
        }
    }
}

// ============================================================================
// Login
// ============================================================================

/// ANY /auth/login (POST required)
///
/// A request that already carries a live session gets `202 Accepted` and a
/// refreshed cookie, whatever its method.
pub async fn login<M>(
    State(state): State<AuthAppState<M>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> AuthResult<Response>
where
    M: SessionValidator + CredentialAuthenticator + Send + Sync + 'static,
{
    let now = Utc::now();
    let cookie = extract_session_cookie(&headers, &state.config.session_cookie_name);

    if cookie.is_some() {
        if let Validation::Authenticated(session) =
            state.manager.validate(cookie.as_deref(), now).await?
        {
            let cookie = session_cookie_header(&state.config, &session, now);
            return Ok((StatusCode::ACCEPTED, [(header::SET_COOKIE, cookie)]).into_response());
        }
    }

    ensure_login_method(&method)?;

    let req: LoginRequest = serde_json::from_slice(&body)
        .map_err(|e| AuthError::BadRequest(format!("unparsable login body: {e}")))?;

    let output = state
        .manager
        .login(&method, Credentials::new(req.identifier, req.password), now)
        .await?;

    let cookie = session_cookie_header(&state.config, &output.session, now);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            token: output.token.into_string(),
            expires_at_ms: output.session.expires_at_ms(),
        }),
    )
        .into_response())
}

// ============================================================================
// Validate
// ============================================================================

/// ANY /auth/validate (GET required)
pub async fn validate<M>(
    State(state): State<AuthAppState<M>>,
    method: Method,
    headers: HeaderMap,
) -> AuthResult<Response>
where
    M: SessionValidator + Send + Sync + 'static,
{
    if method != Method::GET {
        return Err(AuthError::MethodNotAllowed);
    }

    let now = Utc::now();
    let cookie = extract_session_cookie(&headers, &state.config.session_cookie_name);

    match state.manager.validate(cookie.as_deref(), now).await? {
        Validation::Authenticated(session) => {
            let cookie = session_cookie_header(&state.config, &session, now);
            Ok((
                StatusCode::OK,
                [(header::SET_COOKIE, cookie)],
                Json(SessionStatusResponse {
                    status: "ok",
                    expires_at_ms: session.expires_at_ms(),
                }),
            )
                .into_response())
        }
        Validation::Unauthenticated(reason) => {
            tracing::debug!(?reason, "Session validation failed");
            Err(AuthError::SessionInvalid)
        }
    }
}

// ============================================================================
// Logout
// ============================================================================

/// POST /auth/logout
pub async fn logout<M>(
    State(state): State<AuthAppState<M>>,
    headers: HeaderMap,
) -> impl IntoResponse
where
    M: SessionValidator + Send + Sync + 'static,
{
    let cookie = extract_session_cookie(&headers, &state.config.session_cookie_name);

    // The cookie is cleared whatever the store says
    if let Err(e) = state.manager.logout(cookie.as_deref()).await {
        tracing::warn!(error = %e, "Failed to invalidate session on logout");
    }

    let cookie = platform::cookie::delete_cookie_header(&state.config.session_cookie());

    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)])
}

// ============================================================================
// Bearer Token
// ============================================================================

/// GET /auth/token
///
/// Requires `Authorization: Bearer <signed claims>` and the session cookie
/// the claims were issued for.
pub async fn token<M>(
    State(state): State<AuthAppState<M>>,
    headers: HeaderMap,
) -> AuthResult<Json<TokenStatusResponse>>
where
    M: SessionValidator + Send + Sync + 'static,
{
    let bearer = extract_bearer(&headers).ok_or(AuthError::SessionInvalid)?;
    let cookie = extract_session_cookie(&headers, &state.config.session_cookie_name);

    match state
        .manager
        .verify_bearer(bearer, cookie.as_deref(), Utc::now())
        .await?
    {
        Validation::Authenticated(session) => Ok(Json(TokenStatusResponse {
            valid: true,
            expires_at_ms: session.expires_at_ms(),
        })),
        Validation::Unauthenticated(reason) => {
            tracing::debug!(?reason, "Bearer token rejected");
            Err(AuthError::SessionInvalid)
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

pub(crate) fn extract_session_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    platform::cookie::extract_cookie(headers, name)
}

/// Set-Cookie for `session`, Max-Age counting down to its expiry
pub(crate) fn session_cookie_header(
    config: &AuthConfig,
    session: &Session,
    now: DateTime<Utc>,
) -> HeaderValue {
    let cookie = config
        .session_cookie()
        .with_max_age(session.remaining_secs(now));
    platform::cookie::set_cookie_header(&cookie, session.token.as_str())
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
