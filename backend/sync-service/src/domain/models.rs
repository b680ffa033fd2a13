use chrono::{DateTime, Utc};
use record_store::Record;
use serde::{Deserialize, Serialize};

pub type UserId = u64;
pub type PostId = u64;
pub type FollowId = u64;
pub type ConversationId = u64;
pub type MessageId = u64;
pub type NotificationId = u64;

/// Maximum post length in characters
pub const MAX_POST_CHARS: usize = 280;

/// Maximum number of media attachments per post
pub const MAX_POST_MEDIA: usize = 1;

macro_rules! impl_record {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Record for $ty {
                fn id(&self) -> u64 {
                    self.id
                }

                fn assign_id(&mut self, id: u64) {
                    self.id = id;
                }
            }
        )*
    };
}

/// User entity - a member of the network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    pub avatar: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_online: bool,
    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Partial profile update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub is_verified: Option<bool>,
}

impl UserUpdate {
    pub fn apply(self, user: &mut User) {
        if let Some(display_name) = self.display_name {
            user.display_name = display_name;
        }
        if let Some(avatar) = self.avatar {
            user.avatar = avatar;
        }
        if let Some(bio) = self.bio {
            user.bio = Some(bio);
        }
        if let Some(is_verified) = self.is_verified {
            user.is_verified = is_verified;
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

/// Media attachment on a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub url: String,
}

/// Post entity - a short message authored by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default)]
    pub id: PostId,
    pub author_id: UserId,
    pub content: String,
    #[serde(default)]
    pub media: Vec<Media>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub likes: u64,
    /// Viewer-relative flag stored on the post itself (single-viewer model)
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub comments: u64,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Whether any of the post's tags contains `needle` (already lowercased, no `#`)
    pub fn has_tag_containing(&self, needle: &str) -> bool {
        self.hashtags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
    }
}

/// Mutable post fields for `PostsGateway::update`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUpdate {
    pub content: Option<String>,
    pub media: Option<Vec<Media>>,
    pub hashtags: Option<Vec<String>>,
}

/// Post joined with its author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<User>,
}

/// Follow entity - follower_id follows following_id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    #[serde(default)]
    pub id: FollowId,
    pub follower_id: UserId,
    pub following_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Conversation entity - a two-party message thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(default)]
    pub id: ConversationId,
    pub participant_ids: [UserId; 2],
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn has_participant(&self, user_id: UserId) -> bool {
        self.participant_ids.contains(&user_id)
    }

    /// True when the conversation is between exactly `a` and `b`, in either order
    pub fn is_between(&self, a: UserId, b: UserId) -> bool {
        self.has_participant(a) && self.has_participant(b)
    }

    pub fn other_participant(&self, user_id: UserId) -> Option<UserId> {
        match self.participant_ids {
            [x, y] if x == user_id => Some(y),
            [x, y] if y == user_id => Some(x),
            _ => None,
        }
    }
}

/// Conversation joined with participant records and its latest message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub participants: Vec<User>,
    pub last_message: Option<Message>,
}

impl ConversationSummary {
    /// Timestamp used to order the inbox
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_message
            .as_ref()
            .map(|m| m.created_at)
            .unwrap_or(self.conversation.created_at)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Other,
}

/// Message entity - never edited after creation except for read state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    #[serde(rename = "type", default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
}

/// Command payload for `MessagesGateway::send_message`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    #[serde(rename = "type", default)]
    pub message_type: MessageType,
}

/// Notification type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    /// User liked a post
    Like,
    /// User commented on a post
    Comment,
    /// User started following
    Follow,
    /// User mentioned in a post
    Mention,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Like => "like",
            NotificationType::Comment => "comment",
            NotificationType::Follow => "follow",
            NotificationType::Mention => "mention",
        }
    }
}

/// Notification entity - addressed to `user_id`, triggered by `actor_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default)]
    pub id: NotificationId,
    pub user_id: UserId,
    pub actor_id: UserId,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    #[serde(default)]
    pub target_id: Option<u64>,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification joined with the actor who triggered it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    pub actor: Option<User>,
}

/// Hashtag with its global post count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashtagCount {
    pub name: String,
    pub posts_count: u64,
}

/// Raw search result as returned by the search gateway
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub users: Vec<User>,
    pub posts: Vec<PostView>,
    pub hashtags: Vec<HashtagCount>,
}

impl_record!(User, Post, Follow, Conversation, Message, Notification);
