//! Expired Session Reaper
//!
//! Background task that periodically deletes expired sessions. Lookups
//! already treat expired records as gone; the reaper only bounds storage.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::repository::SessionStore;

/// Spawn the reaper; a zero interval disables it and returns `None`
pub fn spawn_session_reaper<S>(store: Arc<S>, interval: Duration) -> Option<JoinHandle<()>>
where
    S: SessionStore + Send + Sync + 'static,
{
    if interval.is_zero() {
        tracing::info!("Session reaper disabled");
        return None;
    }

    tracing::info!(interval_secs = interval.as_secs(), "Starting session reaper");

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match store.cleanup_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(deleted) => {
                    tracing::info!(sessions_deleted = deleted, "Cleaned up expired sessions");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Session cleanup failed");
                }
            }
        }
    }))
}
