//! Background sweep of abandoned call sessions
//!
//! A session whose ended callback never arrives would otherwise live
//! forever in the store.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::CallService;

/// Sweep at most once a minute, more often for short TTLs
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub fn spawn_session_reaper(service: Arc<CallService>, ttl: Duration) -> JoinHandle<()> {
    let period = (ttl / 4).clamp(Duration::from_secs(1), MAX_SWEEP_INTERVAL);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // Skip the first immediate tick.
        interval.tick().await;

        loop {
            interval.tick().await;
            let reaped = service.reap_stale(ttl);
            if reaped > 0 {
                tracing::info!(reaped, remaining = service.sessions().len(), "Session sweep");
            }
        }
    })
}
