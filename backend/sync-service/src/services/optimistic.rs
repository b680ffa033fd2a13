/// Optimistic action coordinator
///
/// Makes toggle-style social actions (like, follow) visible immediately:
/// - the local delta is applied synchronously, before the backend call is issued
/// - a confirmed backend result becomes the new baseline
/// - a failed call restores exactly the pre-call state and surfaces a typed failure
///
/// Each post/follow pair carries an in-flight flag. While it is set, further
/// toggles for the same entity are ignored, so optimistic deltas never stack.
/// A toggle dropped mid-call (timeout, `select!`, torn-down view) rolls back
/// and clears its flag.
use crate::domain::models::{Post, PostId, UserId};
use crate::error::{EntityKind, SyncError, SyncResult};
use crate::gateways::{FollowsGateway, PostsGateway};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Locally known like state of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub likes: u64,
}

impl LikeState {
    fn from_post(post: &Post) -> Self {
        Self {
            liked: post.is_liked,
            likes: post.likes,
        }
    }

    /// State after toggling towards `liked`; the counter moves with the flag
    fn toggled(self, liked: bool) -> Self {
        Self {
            liked,
            likes: if liked {
                self.likes + 1
            } else {
                self.likes.saturating_sub(1)
            },
        }
    }
}

/// Result of a toggle request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome<S> {
    /// The backend confirmed the change; carries the new baseline
    Applied(S),
    /// Nothing was sent: another toggle is in flight, or the entity is already
    /// in the requested state
    Ignored,
}

impl<S> ToggleOutcome<S> {
    pub fn is_applied(&self) -> bool {
        matches!(self, ToggleOutcome::Applied(_))
    }
}

#[derive(Debug, Clone, Copy)]
struct LikeSlot {
    state: LikeState,
    in_flight: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct FollowSlot {
    following: bool,
    in_flight: bool,
}

#[derive(Default)]
struct LocalState {
    likes: HashMap<PostId, LikeSlot>,
    follows: HashMap<(UserId, UserId), FollowSlot>,
}

enum PendingKey {
    Like { post_id: PostId, previous: LikeState },
    Follow { key: (UserId, UserId), previous: bool },
}

/// Restores the pre-call state if a toggle is dropped before the backend answers.
///
/// Armed once the optimistic delta is applied; `disarm` hands settlement back
/// to the caller after the backend call returns.
struct PendingToggle<'a> {
    state: &'a Mutex<LocalState>,
    key: PendingKey,
    armed: bool,
}

impl<'a> PendingToggle<'a> {
    fn like(state: &'a Mutex<LocalState>, post_id: PostId, previous: LikeState) -> Self {
        Self {
            state,
            key: PendingKey::Like { post_id, previous },
            armed: true,
        }
    }

    fn follow(state: &'a Mutex<LocalState>, key: (UserId, UserId), previous: bool) -> Self {
        Self {
            state,
            key: PendingKey::Follow { key, previous },
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingToggle<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock();
        match self.key {
            PendingKey::Like { post_id, previous } => {
                if let Some(slot) = state.likes.get_mut(&post_id) {
                    slot.state = previous;
                    slot.in_flight = false;
                }
                warn!(post_id, likes = previous.likes, "like toggle cancelled, rolled back");
            }
            PendingKey::Follow { key, previous } => {
                if let Some(slot) = state.follows.get_mut(&key) {
                    slot.following = previous;
                    slot.in_flight = false;
                }
                warn!(
                    follower_id = key.0,
                    target_id = key.1,
                    "follow toggle cancelled, rolled back"
                );
            }
        }
    }
}

pub struct OptimisticActionCoordinator {
    posts: Arc<dyn PostsGateway>,
    follows: Arc<dyn FollowsGateway>,
    // Never held across an await
    state: Mutex<LocalState>,
}

impl OptimisticActionCoordinator {
    pub fn new(posts: Arc<dyn PostsGateway>, follows: Arc<dyn FollowsGateway>) -> Self {
        Self {
            posts,
            follows,
            state: Mutex::new(LocalState::default()),
        }
    }

    // ========== Likes ==========

    /// Record the backend's view of a post as the local baseline.
    ///
    /// A post with a toggle in flight keeps its optimistic state; the toggle's
    /// own confirmation or rollback settles it.
    pub fn track_post(&self, post: &Post) {
        let mut state = self.state.lock();
        let slot = state.likes.entry(post.id).or_insert(LikeSlot {
            state: LikeState::from_post(post),
            in_flight: false,
        });
        if !slot.in_flight {
            slot.state = LikeState::from_post(post);
        }
    }

    pub fn track_posts<'a, I>(&self, posts: I)
    where
        I: IntoIterator<Item = &'a Post>,
    {
        for post in posts {
            self.track_post(post);
        }
    }

    /// Current local like state, including any optimistic delta
    pub fn like_state(&self, post_id: PostId) -> Option<LikeState> {
        self.state.lock().likes.get(&post_id).map(|slot| slot.state)
    }

    pub fn like_in_flight(&self, post_id: PostId) -> bool {
        self.state
            .lock()
            .likes
            .get(&post_id)
            .map(|slot| slot.in_flight)
            .unwrap_or(false)
    }

    /// Move a post towards `liked`.
    ///
    /// Fails with `NotFound` for a post that was never tracked, and with
    /// `LikeUpdateFailed` after rolling back when the backend rejects the write.
    pub async fn toggle_like(
        &self,
        post_id: PostId,
        liked: bool,
    ) -> SyncResult<ToggleOutcome<LikeState>> {
        let previous = {
            let mut state = self.state.lock();
            let slot = state
                .likes
                .get_mut(&post_id)
                .ok_or_else(|| SyncError::not_found(EntityKind::Post, post_id))?;

            if slot.in_flight {
                debug!(post_id, "like toggle already in flight, ignoring");
                return Ok(ToggleOutcome::Ignored);
            }
            if slot.state.liked == liked {
                debug!(post_id, liked, "post already in requested like state");
                return Ok(ToggleOutcome::Ignored);
            }

            let previous = slot.state;
            slot.state = previous.toggled(liked);
            slot.in_flight = true;
            debug!(post_id, liked, likes = slot.state.likes, "optimistic like applied");
            previous
        };

        let pending = PendingToggle::like(&self.state, post_id, previous);
        let result = self.posts.toggle_like(post_id, liked).await;
        pending.disarm();

        let mut state = self.state.lock();
        let slot = state.likes.entry(post_id).or_insert(LikeSlot {
            state: previous,
            in_flight: true,
        });
        slot.in_flight = false;

        match result {
            Ok(post) => {
                slot.state = LikeState::from_post(&post);
                info!(post_id, liked = post.is_liked, likes = post.likes, "like confirmed");
                Ok(ToggleOutcome::Applied(slot.state))
            }
            Err(e) => {
                slot.state = previous;
                warn!(post_id, error = %e, likes = previous.likes, "like rolled back");
                Err(SyncError::LikeUpdateFailed {
                    post_id,
                    source: Box::new(e),
                })
            }
        }
    }

    // ========== Follows ==========

    /// Record whether `follower_id` follows `target_id`, unless a toggle is in flight
    pub fn track_follow(&self, follower_id: UserId, target_id: UserId, following: bool) {
        let mut state = self.state.lock();
        let slot = state.follows.entry((follower_id, target_id)).or_default();
        if !slot.in_flight {
            slot.following = following;
        }
    }

    /// Load every relationship `follower_id` currently has from the backend
    pub async fn sync_following(&self, follower_id: UserId) -> SyncResult<usize> {
        let following = self.follows.get_following(follower_id).await?;
        for follow in &following {
            self.track_follow(follower_id, follow.following_id, true);
        }
        debug!(follower_id, count = following.len(), "follow state synced");
        Ok(following.len())
    }

    /// Locally known relationship; an unknown pair counts as not following
    pub fn is_following(&self, follower_id: UserId, target_id: UserId) -> bool {
        self.state
            .lock()
            .follows
            .get(&(follower_id, target_id))
            .map(|slot| slot.following)
            .unwrap_or(false)
    }

    /// Flip the follow relationship between two users.
    ///
    /// Following an already-followed user is a success, not an error. Returns
    /// the confirmed relationship on success.
    pub async fn toggle_follow(
        &self,
        follower_id: UserId,
        target_id: UserId,
    ) -> SyncResult<ToggleOutcome<bool>> {
        if follower_id == target_id {
            return Err(SyncError::InvalidFollowTarget(target_id));
        }

        let key = (follower_id, target_id);
        let follow = {
            let mut state = self.state.lock();
            let slot = state.follows.entry(key).or_default();
            if slot.in_flight {
                debug!(follower_id, target_id, "follow toggle already in flight, ignoring");
                return Ok(ToggleOutcome::Ignored);
            }
            slot.following = !slot.following;
            slot.in_flight = true;
            slot.following
        };
        debug!(follower_id, target_id, follow, "optimistic follow applied");

        let pending = PendingToggle::follow(&self.state, key, !follow);
        let result = if follow {
            match self.follows.follow(follower_id, target_id).await {
                Ok(_) => Ok(()),
                Err(SyncError::Conflict(_)) => {
                    debug!(follower_id, target_id, "already following");
                    Ok(())
                }
                Err(e) => Err(e),
            }
        } else {
            self.follows.unfollow(follower_id, target_id).await
        };
        pending.disarm();

        let mut state = self.state.lock();
        let slot = state.follows.entry(key).or_default();
        slot.in_flight = false;

        match result {
            Ok(()) => {
                slot.following = follow;
                info!(follower_id, target_id, following = follow, "follow confirmed");
                Ok(ToggleOutcome::Applied(follow))
            }
            Err(e) => {
                slot.following = !follow;
                warn!(follower_id, target_id, error = %e, "follow rolled back");
                Err(SyncError::FollowUpdateFailed {
                    follower_id,
                    target_id,
                    source: Box::new(e),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggled_moves_counter_with_flag() {
        let base = LikeState { liked: false, likes: 5 };
        assert_eq!(base.toggled(true), LikeState { liked: true, likes: 6 });
        assert_eq!(
            LikeState { liked: true, likes: 0 }.toggled(false),
            LikeState { liked: false, likes: 0 }
        );
    }

    #[test]
    fn test_toggle_outcome_is_applied() {
        assert!(ToggleOutcome::Applied(true).is_applied());
        assert!(!ToggleOutcome::<bool>::Ignored.is_applied());
    }
}
