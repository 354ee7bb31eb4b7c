//! Auth Router

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{any, get, post},
};
use std::sync::Arc;

use crate::application::capability::{CredentialAuthenticator, SessionValidator};
use crate::application::config::AuthConfig;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::require_session;

/// Create the Auth router
///
/// `/login` and `/validate` accept every method and answer 405 themselves,
/// so a logged-in client hitting `/login` with GET still gets its 202.
pub fn auth_router<M>(manager: Arc<M>, config: Arc<AuthConfig>) -> Router
where
    M: SessionValidator + CredentialAuthenticator + Send + Sync + 'static,
{
    let state = AuthAppState { manager, config };

    Router::new()
        .route("/login", any(handlers::login::<M>))
        .route("/validate", any(handlers::validate::<M>))
        .route("/logout", post(handlers::logout::<M>))
        .route("/token", get(handlers::token::<M>))
        .with_state(state)
}

/// Put `router` behind [`require_session`]
pub fn protect<M>(router: Router, manager: Arc<M>, config: Arc<AuthConfig>) -> Router
where
    M: SessionValidator + Send + Sync + 'static,
{
    let state = AuthAppState { manager, config };
    router.route_layer(from_fn_with_state(state, require_session::<M>))
}
