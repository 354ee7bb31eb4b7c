//! Web Server Entry Point
//!
//! Uses `anyhow` for startup errors; request-level errors go through
//! `auth::AuthError` and `kernel::error::AppError`.

mod app;
mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use auth::domain::{CredentialStore, SessionStore, UserRecord};
use auth::domain::value_object::{identifier::Identifier, user_id::UserId};
use auth::{
    Argon2PasswordVerifier, InMemoryCredentialStore, InMemorySessionStore, PgAuthRepository,
    SessionManager, TokenIssuer, spawn_session_reaper,
};
use chrono::Utc;
use platform::password::ClearTextPassword;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ApiConfig, StoreBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webapp=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env()?;
    tracing::info!(?config, "Configuration loaded");

    let verifier = Arc::new(Argon2PasswordVerifier::new(
        config.auth.password_pepper.clone(),
    ));

    match config.backend.clone() {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; sessions do not survive a restart");

            let users = Arc::new(InMemoryCredentialStore::new());
            if let Some(dev) = &config.dev_user {
                users.register(&dev.identifier, dev.password.clone(), &verifier)?;
            } else {
                tracing::warn!("AUTH_DEV_USER is unset; nobody can log in");
            }
            let sessions = Arc::new(InMemorySessionStore::from_config(&config.auth));

            serve(config, users, sessions, verifier).await
        }
        StoreBackend::Postgres { database_url } => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await?;

            tracing::info!("Connected to database");

            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;

            tracing::info!("Migrations completed");

            let repo = Arc::new(PgAuthRepository::new(pool, &config.auth));

            // Startup cleanup must not prevent the server from starting
            match repo.cleanup_expired(Utc::now()).await {
                Ok(sessions) => {
                    tracing::info!(sessions_deleted = sessions, "Auth session cleanup completed");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Auth session cleanup failed, continuing anyway");
                }
            }

            if let Some(dev) = &config.dev_user {
                let password = ClearTextPassword::new(dev.password.clone())?;
                let record = UserRecord::new(
                    UserId::new(),
                    Identifier::new(&dev.identifier)?,
                    verifier.hash(&password)?,
                );
                let user_id = repo.insert_user(&record).await?;
                tracing::info!(%user_id, "Development user seeded");
            }

            serve(config, Arc::clone(&repo), repo, verifier).await
        }
    }
}

async fn serve<C, S>(
    config: ApiConfig,
    credentials: Arc<C>,
    sessions: Arc<S>,
    verifier: Arc<Argon2PasswordVerifier>,
) -> anyhow::Result<()>
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    let reaper = spawn_session_reaper(Arc::clone(&sessions), config.reaper_interval);

    let issuer = TokenIssuer::new(config.auth.signing_keys.clone());
    let manager = SessionManager::new(credentials, sessions, verifier, issuer);

    let app = app::build_router(
        Arc::new(manager),
        Arc::new(config.auth),
        &config.frontend_origins,
    );

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Some(handle) = reaper {
        handle.abort();
    }
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
