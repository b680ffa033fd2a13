//! Shared fixtures for sync-service integration tests
#![allow(dead_code)]

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use record_store::LatencyConfig;
use std::time::Duration;
use sync_service::backend::InMemoryBackend;
use sync_service::config::Config;
use sync_service::domain::models::*;
use sync_service::gateways::Gateways;

pub struct Harness {
    pub store: InMemoryBackend,
    pub gateways: Gateways,
    pub config: Config,
}

impl Harness {
    pub fn new(latency: LatencyConfig) -> Self {
        let config = Config::default();
        let store = InMemoryBackend::new(latency);
        let gateways = Gateways::new(&store.backend(), &config);
        Self {
            store,
            gateways,
            config,
        }
    }

    /// Zero-latency backend for logic-only tests
    pub fn instant() -> Self {
        Self::new(LatencyConfig::none())
    }

    /// Read 200ms / write 300ms; pair with `start_paused = true`
    pub fn with_latency() -> Self {
        Self::new(LatencyConfig::default())
    }

    pub fn add_user(&self, username: &str, is_online: bool) -> User {
        self.store.users.insert_now(user(username, is_online))
    }

    pub fn add_post(&self, author_id: UserId, content: &str, tags: &[&str], likes: u64) -> Post {
        self.store.posts.insert_now(post(author_id, content, tags, likes))
    }

    pub fn add_conversation(&self, a: UserId, b: UserId) -> Conversation {
        let created = ts(0);
        self.store.conversations.insert_now(Conversation {
            id: 0,
            participant_ids: [a, b],
            created_at: created,
            updated_at: created,
        })
    }

    pub fn add_message(
        &self,
        conversation_id: ConversationId,
        sender_id: UserId,
        content: &str,
        minute: i64,
    ) -> Message {
        self.store.messages.insert_now(Message {
            id: 0,
            conversation_id,
            sender_id,
            content: content.to_string(),
            message_type: MessageType::Text,
            is_read: false,
            created_at: ts(minute),
            read_at: None,
        })
    }

    pub fn add_notification(
        &self,
        user_id: UserId,
        actor_id: UserId,
        notification_type: NotificationType,
        minute: i64,
        read: bool,
    ) -> Notification {
        self.store.notifications.insert_now(Notification {
            id: 0,
            user_id,
            actor_id,
            notification_type,
            target_id: None,
            read,
            created_at: ts(minute),
        })
    }
}

/// Fixed base time plus `minute` minutes
pub fn ts(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap() + ChronoDuration::minutes(minute)
}

pub fn user(username: &str, is_online: bool) -> User {
    User {
        id: 0,
        username: username.to_string(),
        display_name: username.to_string(),
        avatar: format!("https://images.test/{username}.png"),
        bio: None,
        is_verified: false,
        is_online,
        last_seen: ts(0),
        created_at: ts(0),
    }
}

pub fn post(author_id: UserId, content: &str, tags: &[&str], likes: u64) -> Post {
    Post {
        id: 0,
        author_id,
        content: content.to_string(),
        media: Vec::new(),
        hashtags: tags.iter().map(|t| t.to_string()).collect(),
        likes,
        is_liked: false,
        comments: 0,
        created_at: ts(0),
    }
}

/// Advance paused time far enough for the spawned task to reach its first suspension
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
