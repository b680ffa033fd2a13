use super::join::author_index;
use super::traits::{NewNotification, NotificationsGateway};
use crate::domain::models::*;
use crate::error::{store_error, EntityKind, SyncError, SyncResult};
use chrono::Utc;
use record_store::{RecordStore, StoreError};
use std::sync::Arc;
use tracing::{debug, info};

/// Notifications gateway backed by record stores; joins the actor on read
#[derive(Clone)]
pub struct StoreNotificationsGateway {
    notifications: Arc<dyn RecordStore<Notification>>,
    users: Arc<dyn RecordStore<User>>,
}

impl StoreNotificationsGateway {
    pub fn new(
        notifications: Arc<dyn RecordStore<Notification>>,
        users: Arc<dyn RecordStore<User>>,
    ) -> Self {
        Self {
            notifications,
            users,
        }
    }
}

#[async_trait::async_trait]
impl NotificationsGateway for StoreNotificationsGateway {
    async fn get_by_user_id(&self, user_id: UserId) -> SyncResult<Vec<NotificationView>> {
        let mut notifications = self
            .notifications
            .find(&move |n: &Notification| n.user_id == user_id)
            .await
            .map_err(store_error(EntityKind::Notification))?;
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let actors = author_index(&self.users).await?;
        Ok(notifications
            .into_iter()
            .map(|notification| NotificationView {
                actor: actors.get(&notification.actor_id).cloned(),
                notification,
            })
            .collect())
    }

    async fn mark_as_read(&self, id: NotificationId) -> SyncResult<Notification> {
        self.notifications
            .update(id, Box::new(|n: &mut Notification| n.read = true))
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => SyncError::NotificationNotFound(id),
                other => store_error(EntityKind::Notification)(other),
            })
    }

    async fn mark_all_as_read(&self, user_id: UserId) -> SyncResult<usize> {
        let touched = self
            .notifications
            .update_where(
                &move |n: &Notification| n.user_id == user_id && !n.read,
                &|n: &mut Notification| n.read = true,
            )
            .await
            .map_err(store_error(EntityKind::Notification))?;
        debug!(user_id, touched, "notifications marked read");
        Ok(touched)
    }

    async fn create(&self, new_notification: NewNotification) -> SyncResult<Notification> {
        let notification = Notification {
            id: 0,
            user_id: new_notification.user_id,
            actor_id: new_notification.actor_id,
            notification_type: new_notification.notification_type,
            target_id: new_notification.target_id,
            read: false,
            created_at: Utc::now(),
        };
        let stored = self
            .notifications
            .insert(notification)
            .await
            .map_err(store_error(EntityKind::Notification))?;
        info!(
            notification_id = stored.id,
            user_id = stored.user_id,
            kind = stored.notification_type.as_str(),
            "notification created"
        );
        Ok(stored)
    }
}
