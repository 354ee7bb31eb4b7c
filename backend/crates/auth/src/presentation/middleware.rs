//! Auth Middleware
//!
//! Middleware for requiring a live session on protected routes.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};

use crate::application::capability::{SessionValidator, Validation};
use crate::domain::value_object::user_id::UserId;
use crate::error::AuthError;
use crate::presentation::handlers::{AuthAppState, extract_session_cookie, session_cookie_header};

/// Identity of the caller, inserted into request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

/// Middleware that requires a valid session
///
/// Use with `axum::middleware::from_fn_with_state`. The session is slid
/// forward and the refreshed cookie is appended to the response. Without a
/// session the caller gets 401, or a 302 to `login_redirect` when set.
pub async fn require_session<M>(
    State(state): State<AuthAppState<M>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    M: SessionValidator + Send + Sync + 'static,
{
    let now = Utc::now();
    let cookie = extract_session_cookie(req.headers(), &state.config.session_cookie_name);

    let session = match state.manager.validate(cookie.as_deref(), now).await {
        Ok(Validation::Authenticated(session)) => session,
        Ok(Validation::Unauthenticated(reason)) => {
            tracing::debug!(?reason, path = %req.uri().path(), "Unauthenticated request");
            return match &state.config.login_redirect {
                Some(location) => (StatusCode::FOUND, [(header::LOCATION, location.clone())])
                    .into_response(),
                None => AuthError::SessionInvalid.into_response(),
            };
        }
        Err(e) => return e.into_response(),
    };

    req.extensions_mut().insert(AuthenticatedUser {
        user_id: session.user_id,
        expires_at: session.expires_at,
    });

    let mut response = next.run(req).await;
    response.headers_mut().append(
        header::SET_COOKIE,
        session_cookie_header(&state.config, &session, now),
    );
    response
}
