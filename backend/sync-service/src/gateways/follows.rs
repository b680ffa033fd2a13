use super::traits::FollowsGateway;
use crate::domain::models::{Follow, UserId};
use crate::error::{store_error, EntityKind, SyncError, SyncResult};
use chrono::Utc;
use record_store::{InsertOutcome, RecordStore};
use std::sync::Arc;
use tracing::info;

/// Follows gateway backed by a record store.
/// The (follower, following) pair is unique; the uniqueness check and the
/// insert run in one critical section of the store.
#[derive(Clone)]
pub struct StoreFollowsGateway {
    follows: Arc<dyn RecordStore<Follow>>,
}

impl StoreFollowsGateway {
    pub fn new(follows: Arc<dyn RecordStore<Follow>>) -> Self {
        Self { follows }
    }

    fn pair_key(follower_id: UserId, following_id: UserId) -> String {
        format!("{follower_id}->{following_id}")
    }
}

#[async_trait::async_trait]
impl FollowsGateway for StoreFollowsGateway {
    async fn get_followers(&self, user_id: UserId) -> SyncResult<Vec<Follow>> {
        self.follows
            .find(&move |f: &Follow| f.following_id == user_id)
            .await
            .map_err(store_error(EntityKind::Follow))
    }

    async fn get_following(&self, user_id: UserId) -> SyncResult<Vec<Follow>> {
        self.follows
            .find(&move |f: &Follow| f.follower_id == user_id)
            .await
            .map_err(store_error(EntityKind::Follow))
    }

    async fn is_following(&self, follower_id: UserId, following_id: UserId) -> SyncResult<bool> {
        let found = self
            .follows
            .find(&move |f: &Follow| {
                f.follower_id == follower_id && f.following_id == following_id
            })
            .await
            .map_err(store_error(EntityKind::Follow))?;
        Ok(!found.is_empty())
    }

    async fn follow(&self, follower_id: UserId, following_id: UserId) -> SyncResult<Follow> {
        if follower_id == following_id {
            return Err(SyncError::Validation(format!(
                "user {follower_id} cannot follow themselves"
            )));
        }

        let follow = Follow {
            id: 0,
            follower_id,
            following_id,
            created_at: Utc::now(),
        };
        let outcome = self
            .follows
            .insert_unless(follow, &move |f: &Follow| {
                f.follower_id == follower_id && f.following_id == following_id
            })
            .await
            .map_err(store_error(EntityKind::Follow))?;

        match outcome {
            InsertOutcome::Inserted(follow) => {
                info!(follower_id, following_id, follow_id = follow.id, "follow created");
                Ok(follow)
            }
            InsertOutcome::Existing(_) => Err(SyncError::Conflict(format!(
                "{} already exists",
                Self::pair_key(follower_id, following_id)
            ))),
        }
    }

    async fn unfollow(&self, follower_id: UserId, following_id: UserId) -> SyncResult<()> {
        let removed = self
            .follows
            .delete_where(&move |f: &Follow| {
                f.follower_id == follower_id && f.following_id == following_id
            })
            .await
            .map_err(store_error(EntityKind::Follow))?;

        if removed == 0 {
            return Err(SyncError::NotFoundByKey {
                entity: EntityKind::Follow,
                key: Self::pair_key(follower_id, following_id),
            });
        }
        info!(follower_id, following_id, "follow removed");
        Ok(())
    }
}
