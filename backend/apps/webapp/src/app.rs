//! Router Assembly

use std::sync::Arc;

use auth::middleware::AuthenticatedUser;
use auth::{AuthConfig, CredentialAuthenticator, SessionValidator, auth_router, protect};
use axum::{
    Extension, Json, Router,
    http::{self, Method, header},
    routing::get,
};
use serde::Serialize;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    user_id: String,
    expires_at_ms: i64,
}

/// GET /api/me
async fn me(Extension(user): Extension<AuthenticatedUser>) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: user.user_id.to_string(),
        expires_at_ms: user.expires_at.timestamp_millis(),
    })
}

async fn health() -> &'static str {
    "ok"
}

/// Build the full application router
///
/// `/auth/*` is public, `/api/*` sits behind `require_session`.
pub fn build_router<M>(
    manager: Arc<M>,
    config: Arc<AuthConfig>,
    frontend_origins: &[String],
) -> Router
where
    M: SessionValidator + CredentialAuthenticator + Send + Sync + 'static,
{
    let protected = protect(
        Router::new().route("/me", get(me)),
        Arc::clone(&manager),
        Arc::clone(&config),
    );

    Router::new()
        .nest("/auth", auth_router(manager, config))
        .nest("/api", protected)
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors(frontend_origins))
}

fn cors(frontend_origins: &[String]) -> CorsLayer {
    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true)
}
