//! Presence snapshot polling
//!
//! Periodically fetches every user and keeps the set of ids that are online.
//! There is no ordering requirement between snapshots: the last one wins.
//! Background refresh failures keep the previous snapshot and are logged with
//! a consecutive-failure count.

use super::BackgroundTask;
use crate::domain::models::{Conversation, UserId};
use crate::error::SyncResult;
use crate::gateways::UsersGateway;
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

/// Failures in a row before the loop escalates from `warn` to `error`
const MAX_CONSECUTIVE_FAILURES: u32 = 5;

struct PresenceInner {
    users: Arc<dyn UsersGateway>,
    online: RwLock<HashSet<UserId>>,
}

impl PresenceInner {
    async fn refresh(&self) -> SyncResult<usize> {
        let users = self.users.get_all().await?;
        let online: HashSet<UserId> = users
            .into_iter()
            .filter(|u| u.is_online)
            .map(|u| u.id)
            .collect();
        let count = online.len();
        *self.online.write() = online;
        Ok(count)
    }
}

pub struct PresenceTracker {
    inner: Arc<PresenceInner>,
    interval: Duration,
    task: Mutex<Option<BackgroundTask>>,
}

impl PresenceTracker {
    pub fn new(users: Arc<dyn UsersGateway>, interval: Duration) -> Self {
        Self {
            inner: Arc::new(PresenceInner {
                users,
                online: RwLock::new(HashSet::new()),
            }),
            interval,
            task: Mutex::new(None),
        }
    }

    /// Start polling. The first snapshot is taken immediately; restarting
    /// replaces the running loop.
    pub fn start(&self) {
        let inner = self.inner.clone();
        let interval = self.interval;
        let task = BackgroundTask::spawn(move |shutdown| presence_loop(inner, interval, shutdown));
        *self.task.lock() = Some(task);
        tracing::info!(interval_ms = interval.as_millis() as u64, "presence tracking started");
    }

    pub fn stop(&self) {
        if self.task.lock().take().is_some() {
            tracing::info!("presence tracking stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .map(BackgroundTask::is_running)
            .unwrap_or(false)
    }

    /// Take a snapshot now; returns the number of online users
    pub async fn refresh(&self) -> SyncResult<usize> {
        self.inner.refresh().await
    }

    pub fn is_online(&self, user_id: UserId) -> bool {
        self.inner.online.read().contains(&user_id)
    }

    pub fn online_ids(&self) -> HashSet<UserId> {
        self.inner.online.read().clone()
    }

    /// Participants of `conversation` present in the latest snapshot
    pub fn online_participants(&self, conversation: &Conversation) -> Vec<UserId> {
        let online = self.inner.online.read();
        conversation
            .participant_ids
            .iter()
            .copied()
            .filter(|id| online.contains(id))
            .collect()
    }
}

impl Drop for PresenceTracker {
    fn drop(&mut self) {
        self.task.lock().take();
    }
}

async fn presence_loop(
    inner: Arc<PresenceInner>,
    interval: Duration,
    mut shutdown: watch::Receiver<()>,
) {
    let mut consecutive_failures = 0u32;

    loop {
        match inner.refresh().await {
            Ok(online) => {
                if consecutive_failures > 0 {
                    tracing::info!(
                        previous_failures = consecutive_failures,
                        "presence refresh recovered"
                    );
                }
                consecutive_failures = 0;
                tracing::debug!(online, "presence snapshot updated");
            }
            Err(e) => {
                consecutive_failures += 1;
                if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    tracing::error!(
                        consecutive_failures,
                        error = %e,
                        "presence refresh failing repeatedly"
                    );
                } else {
                    tracing::warn!(consecutive_failures, error = %e, "presence refresh failed");
                }
            }
        }

        tokio::select! {
            _ = shutdown.changed() => {
                tracing::debug!("presence loop shutting down");
                break;
            }
            _ = sleep(interval) => {}
        }
    }
}
