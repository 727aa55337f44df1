//! Periodic purge of expired and revoked sessions.
//!
//! [`SessionCleanup`] runs one sweep immediately on [`start`](SessionCleanup::start)
//! and then one per interval until [`stop`](SessionCleanup::stop). A failed
//! sweep is logged and retried on the next tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::auth::SessionLifecycleManager;

/// How long [`SessionCleanup::stop`] waits for the task before aborting it.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Start/stop handle for the cleanup task.
///
/// Dropping the handle cancels the task.
pub struct SessionCleanup {
    auth: Arc<SessionLifecycleManager>,
    interval: Duration,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl SessionCleanup {
    pub fn new(auth: Arc<SessionLifecycleManager>, interval: Duration) -> Self {
        Self {
            auth,
            interval,
            cancel: CancellationToken::new(),
            handle: None,
        }
    }

    /// Spawn the sweep loop.
    ///
    /// Returns `false` without spawning if it is already running or has
    /// been stopped; a stopped handle cannot be restarted.
    pub fn start(&mut self) -> bool {
        if self.handle.is_some() || self.cancel.is_cancelled() {
            tracing::warn!("Session cleanup start ignored: already started or stopped");
            return false;
        }

        let auth = Arc::clone(&self.auth);
        let cancel = self.cancel.clone();
        let interval = self.interval;
        self.handle = Some(tokio::spawn(run(auth, interval, cancel)));
        true
    }

    /// Whether the loop has been started and not yet stopped.
    pub fn is_running(&self) -> bool {
        self.handle.is_some() && !self.cancel.is_cancelled()
    }

    /// Signal the loop to exit and wait for it. Safe to call repeatedly.
    pub async fn stop(&mut self) {
        self.cancel.cancel();

        let Some(mut handle) = self.handle.take() else {
            return;
        };

        if tokio::time::timeout(STOP_TIMEOUT, &mut handle).await.is_err() {
            tracing::warn!("Session cleanup did not stop in time; aborting");
            handle.abort();
        }
    }
}

impl Drop for SessionCleanup {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// The sweep loop. The first tick fires immediately.
async fn run(auth: Arc<SessionLifecycleManager>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        "Session cleanup job started"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    result = auth.purge_expired_sessions() => match result {
                        Ok(deleted) if deleted > 0 => {
                            tracing::info!(deleted, "Session cleanup: purged sessions");
                        }
                        Ok(_) => tracing::debug!("Session cleanup: no sessions to purge"),
                        // Detail already logged by the storage layer.
                        Err(e) => tracing::error!(error = %e, "Session cleanup failed; retrying next tick"),
                    },
                }
            }
        }
    }

    tracing::info!("Session cleanup job stopping");
}

#[cfg(test)]
mod tests {
    use bizhub_db::models::session::ClientMeta;
    use bizhub_db::store::{MemorySessionStore, MemoryUserDirectory, SessionStore};
    use chrono::Utc;

    use super::*;
    use crate::auth::jwt::SigningKey;
    use crate::config::AuthConfig;

    fn manager(sessions: Arc<MemorySessionStore>) -> Arc<SessionLifecycleManager> {
        let config = AuthConfig::with_key(SigningKey::generate());
        Arc::new(SessionLifecycleManager::new(
            Arc::new(MemoryUserDirectory::new()),
            sessions,
            &config,
        ))
    }

    async fn expired_row(sessions: &MemorySessionStore, hash: &str) -> i64 {
        let id = sessions
            .create(1, &ClientMeta::default(), Utc::now() + chrono::Duration::minutes(5))
            .await
            .unwrap();
        sessions
            .finalize(id, hash, Utc::now() - chrono::Duration::seconds(1))
            .await
            .unwrap();
        id
    }

    async fn live_row(sessions: &MemorySessionStore, hash: &str) -> i64 {
        let id = sessions
            .create(1, &ClientMeta::default(), Utc::now() + chrono::Duration::minutes(5))
            .await
            .unwrap();
        sessions
            .finalize(id, hash, Utc::now() + chrono::Duration::hours(1))
            .await
            .unwrap();
        id
    }

    /// Poll until `cond` holds or a second elapses.
    async fn eventually<F, Fut>(mut cond: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..100 {
            if cond().await {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn sweeps_once_at_start() {
        let sessions = Arc::new(MemorySessionStore::new());
        let expired = expired_row(&sessions, "expired").await;
        let live = live_row(&sessions, "live").await;

        let mut cleanup = SessionCleanup::new(manager(sessions.clone()), Duration::from_secs(3600));
        assert!(cleanup.start());
        assert!(cleanup.is_running());

        let store = sessions.clone();
        assert!(eventually(|| { let s = store.clone(); async move { s.get(expired).await.is_none() } }).await);
        assert!(sessions.get(live).await.is_some(), "live session must survive a sweep");

        cleanup.stop().await;
        assert!(!cleanup.is_running());
    }

    #[tokio::test]
    async fn sweeps_again_on_each_interval() {
        let sessions = Arc::new(MemorySessionStore::new());
        let mut cleanup = SessionCleanup::new(manager(sessions.clone()), Duration::from_millis(20));
        cleanup.start();

        // Created after the initial sweep; only a later tick can remove it.
        tokio::time::sleep(Duration::from_millis(5)).await;
        let expired = expired_row(&sessions, "late").await;

        let store = sessions.clone();
        assert!(eventually(|| { let s = store.clone(); async move { s.get(expired).await.is_none() } }).await);

        cleanup.stop().await;
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_start_after_stop_is_refused() {
        let sessions = Arc::new(MemorySessionStore::new());
        let mut cleanup = SessionCleanup::new(manager(sessions), Duration::from_secs(3600));

        // Stopping a never-started handle is a no-op.
        cleanup.stop().await;
        assert!(!cleanup.start());

        let sessions = Arc::new(MemorySessionStore::new());
        let mut cleanup = SessionCleanup::new(manager(sessions), Duration::from_secs(3600));
        assert!(cleanup.start());
        assert!(!cleanup.start(), "second start must not spawn another loop");

        cleanup.stop().await;
        cleanup.stop().await;
        assert!(!cleanup.is_running());
    }
}
