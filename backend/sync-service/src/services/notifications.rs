use crate::domain::models::{Notification, NotificationId, NotificationView, UserId};
use crate::error::SyncResult;
use crate::gateways::NotificationsGateway;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

/// Read-state reconciler for one user's notification list.
///
/// Local state changes only after the backend confirms, and the unread count
/// is always derived from the list.
pub struct NotificationReconciler {
    gateway: Arc<dyn NotificationsGateway>,
    user_id: UserId,
    items: RwLock<Vec<NotificationView>>,
}

impl NotificationReconciler {
    pub fn new(gateway: Arc<dyn NotificationsGateway>, user_id: UserId) -> Self {
        Self {
            gateway,
            user_id,
            items: RwLock::new(Vec::new()),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Replace the local list with the backend's; returns its length
    pub async fn load(&self) -> SyncResult<usize> {
        let mut fetched = self.gateway.get_by_user_id(self.user_id).await?;
        sort_newest_first(&mut fetched);
        let count = fetched.len();
        *self.items.write() = fetched;
        debug!(user_id = self.user_id, count, "notifications loaded");
        Ok(count)
    }

    /// Newest first
    pub fn notifications(&self) -> Vec<NotificationView> {
        self.items.read().clone()
    }

    pub fn unread_count(&self) -> usize {
        self.items
            .read()
            .iter()
            .filter(|item| !item.notification.read)
            .count()
    }

    /// Mark a single notification read; `NotificationNotFound` if the backend
    /// doesn't know the id.
    pub async fn mark_one_read(&self, id: NotificationId) -> SyncResult<Notification> {
        let confirmed = self.gateway.mark_as_read(id).await?;

        let mut items = self.items.write();
        if let Some(item) = items.iter_mut().find(|item| item.notification.id == id) {
            item.notification.read = confirmed.read;
        }
        debug!(notification_id = id, "notification marked read");
        Ok(confirmed)
    }

    /// Mark every notification of `user_id` read, then mirror that onto the
    /// local list. Already-read items are unaffected.
    pub async fn mark_all_read(&self, user_id: UserId) -> SyncResult<usize> {
        let touched = self.gateway.mark_all_as_read(user_id).await?;

        let mut items = self.items.write();
        for item in items
            .iter_mut()
            .filter(|item| item.notification.user_id == user_id)
        {
            item.notification.read = true;
        }
        info!(user_id, touched, "all notifications marked read");
        Ok(touched)
    }
}

fn sort_newest_first(items: &mut [NotificationView]) {
    items.sort_by(|a, b| {
        b.notification
            .created_at
            .cmp(&a.notification.created_at)
            .then(b.notification.id.cmp(&a.notification.id))
    });
}
