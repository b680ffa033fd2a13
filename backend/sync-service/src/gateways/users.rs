use super::traits::UsersGateway;
use crate::domain::models::{User, UserId, UserUpdate};
use crate::error::{store_error, EntityKind, SyncError, SyncResult};
use chrono::Utc;
use record_store::RecordStore;
use std::sync::Arc;
use tracing::debug;

/// Users gateway backed by a record store
#[derive(Clone)]
pub struct StoreUsersGateway {
    users: Arc<dyn RecordStore<User>>,
    suggested_limit: usize,
}

impl StoreUsersGateway {
    pub fn new(users: Arc<dyn RecordStore<User>>, suggested_limit: usize) -> Self {
        Self {
            users,
            suggested_limit,
        }
    }
}

#[async_trait::async_trait]
impl UsersGateway for StoreUsersGateway {
    async fn get_all(&self) -> SyncResult<Vec<User>> {
        self.users
            .get_all()
            .await
            .map_err(store_error(EntityKind::User))
    }

    async fn get_by_id(&self, id: UserId) -> SyncResult<User> {
        self.users
            .get_by_id(id)
            .await
            .map_err(store_error(EntityKind::User))
    }

    async fn get_by_username(&self, username: &str) -> SyncResult<User> {
        let wanted = username.to_string();
        let matches = self
            .users
            .find(&move |u: &User| u.username == wanted)
            .await
            .map_err(store_error(EntityKind::User))?;

        matches
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::NotFoundByKey {
                entity: EntityKind::User,
                key: username.to_string(),
            })
    }

    async fn get_suggested(&self, excluding: UserId) -> SyncResult<Vec<User>> {
        let mut users = self
            .users
            .find(&move |u: &User| u.id != excluding)
            .await
            .map_err(store_error(EntityKind::User))?;
        users.truncate(self.suggested_limit);
        Ok(users)
    }

    async fn update(&self, id: UserId, update: UserUpdate) -> SyncResult<User> {
        debug!(user_id = id, "updating profile");
        self.users
            .update(id, Box::new(move |u: &mut User| update.apply(u)))
            .await
            .map_err(store_error(EntityKind::User))
    }

    async fn update_online_status(&self, id: UserId, is_online: bool) -> SyncResult<User> {
        let now = Utc::now();
        self.users
            .update(
                id,
                Box::new(move |u: &mut User| {
                    u.is_online = is_online;
                    u.last_seen = now;
                }),
            )
            .await
            .map_err(store_error(EntityKind::User))
    }
}
