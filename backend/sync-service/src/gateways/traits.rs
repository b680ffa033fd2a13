use crate::domain::models::*;
use crate::error::SyncResult;

/// Command payload for `PostsGateway::create`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPost {
    pub author_id: UserId,
    pub content: String,
    pub media: Vec<Media>,
    pub hashtags: Vec<String>,
}

/// Command payload for `NotificationsGateway::create`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: UserId,
    pub actor_id: UserId,
    pub notification_type: NotificationType,
    pub target_id: Option<u64>,
}

/// Query/command facade over the users collection.
#[async_trait::async_trait]
pub trait UsersGateway: Send + Sync {
    async fn get_all(&self) -> SyncResult<Vec<User>>;

    async fn get_by_id(&self, id: UserId) -> SyncResult<User>;

    async fn get_by_username(&self, username: &str) -> SyncResult<User>;

    /// First few users other than `excluding`, in id order
    async fn get_suggested(&self, excluding: UserId) -> SyncResult<Vec<User>>;

    /// Apply a partial profile update; `username` is immutable
    async fn update(&self, id: UserId, update: UserUpdate) -> SyncResult<User>;

    /// Set presence and stamp `last_seen`
    async fn update_online_status(&self, id: UserId, is_online: bool) -> SyncResult<User>;
}

/// Query/command facade over posts, joining authors on read.
#[async_trait::async_trait]
pub trait PostsGateway: Send + Sync {
    /// Newest first
    async fn get_all(&self) -> SyncResult<Vec<PostView>>;

    async fn get_by_id(&self, id: PostId) -> SyncResult<PostView>;

    /// Newest first
    async fn get_by_user_id(&self, user_id: UserId) -> SyncResult<Vec<PostView>>;

    /// Most liked first, bounded
    async fn get_trending(&self) -> SyncResult<Vec<PostView>>;

    async fn create(&self, post: NewPost) -> SyncResult<Post>;

    async fn update(&self, id: PostId, update: PostUpdate) -> SyncResult<Post>;

    async fn delete(&self, id: PostId) -> SyncResult<()>;

    /// Set the liked flag and move the counter by one in the same write
    async fn toggle_like(&self, post_id: PostId, liked: bool) -> SyncResult<Post>;
}

/// Query/command facade over follow relationships.
#[async_trait::async_trait]
pub trait FollowsGateway: Send + Sync {
    /// Follows whose `following_id` is `user_id`
    async fn get_followers(&self, user_id: UserId) -> SyncResult<Vec<Follow>>;

    /// Follows whose `follower_id` is `user_id`
    async fn get_following(&self, user_id: UserId) -> SyncResult<Vec<Follow>>;

    async fn is_following(&self, follower_id: UserId, following_id: UserId) -> SyncResult<bool>;

    /// `Validation` on self-follow, `Conflict` if the pair already exists
    async fn follow(&self, follower_id: UserId, following_id: UserId) -> SyncResult<Follow>;

    /// `NotFound` if the relationship does not exist
    async fn unfollow(&self, follower_id: UserId, following_id: UserId) -> SyncResult<()>;
}

/// Query/command facade over conversations and their messages.
#[async_trait::async_trait]
pub trait MessagesGateway: Send + Sync {
    /// Conversations the user takes part in, most recently active first
    async fn get_conversations(&self, user_id: UserId) -> SyncResult<Vec<ConversationSummary>>;

    async fn get_conversation(&self, id: ConversationId) -> SyncResult<Conversation>;

    /// Oldest first, ties broken by id
    async fn get_messages(&self, conversation_id: ConversationId) -> SyncResult<Vec<Message>>;

    async fn send_message(&self, message: NewMessage) -> SyncResult<Message>;

    /// Idempotent: returns the existing conversation for the pair if there is one.
    /// Participants are joined; `last_message` is always `None`.
    async fn create_conversation(
        &self,
        user_a: UserId,
        user_b: UserId,
    ) -> SyncResult<ConversationSummary>;

    /// Mark messages from the other participant as read; returns how many changed
    async fn mark_as_read(&self, conversation_id: ConversationId, user_id: UserId)
        -> SyncResult<usize>;

    /// Remove the conversation and every message in it
    async fn delete_conversation(&self, conversation_id: ConversationId) -> SyncResult<()>;
}

/// Query/command facade over notifications, joining actors on read.
#[async_trait::async_trait]
pub trait NotificationsGateway: Send + Sync {
    /// Newest first
    async fn get_by_user_id(&self, user_id: UserId) -> SyncResult<Vec<NotificationView>>;

    async fn mark_as_read(&self, id: NotificationId) -> SyncResult<Notification>;

    /// Returns how many notifications were touched
    async fn mark_all_as_read(&self, user_id: UserId) -> SyncResult<usize>;

    async fn create(&self, notification: NewNotification) -> SyncResult<Notification>;
}

/// Free-text search across users, posts and hashtags.
#[async_trait::async_trait]
pub trait SearchGateway: Send + Sync {
    async fn search(&self, query: &str) -> SyncResult<SearchResults>;
}
