//! Persistence backend wiring
//!
//! `Backend` bundles one `RecordStore` per entity type behind trait objects.
//! Gateways only ever see this bundle, so the volatile in-memory store can be
//! swapped for a real database without touching the coordination layer.
use crate::domain::models::{Conversation, Follow, Message, Notification, Post, User};
use record_store::{InMemoryStore, LatencyConfig, RecordStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct Backend {
    pub users: Arc<dyn RecordStore<User>>,
    pub posts: Arc<dyn RecordStore<Post>>,
    pub follows: Arc<dyn RecordStore<Follow>>,
    pub conversations: Arc<dyn RecordStore<Conversation>>,
    pub messages: Arc<dyn RecordStore<Message>>,
    pub notifications: Arc<dyn RecordStore<Notification>>,
}

/// Concrete in-memory collections, kept around so callers can seed them and
/// inject faults while handing `Backend` to the gateways.
#[derive(Clone)]
pub struct InMemoryBackend {
    pub users: Arc<InMemoryStore<User>>,
    pub posts: Arc<InMemoryStore<Post>>,
    pub follows: Arc<InMemoryStore<Follow>>,
    pub conversations: Arc<InMemoryStore<Conversation>>,
    pub messages: Arc<InMemoryStore<Message>>,
    pub notifications: Arc<InMemoryStore<Notification>>,
}

impl InMemoryBackend {
    pub fn new(latency: LatencyConfig) -> Self {
        Self {
            users: Arc::new(InMemoryStore::named("users", latency)),
            posts: Arc::new(InMemoryStore::named("posts", latency)),
            follows: Arc::new(InMemoryStore::named("follows", latency)),
            conversations: Arc::new(InMemoryStore::named("conversations", latency)),
            messages: Arc::new(InMemoryStore::named("messages", latency)),
            notifications: Arc::new(InMemoryStore::named("notifications", latency)),
        }
    }

    pub fn backend(&self) -> Backend {
        Backend {
            users: self.users.clone(),
            posts: self.posts.clone(),
            follows: self.follows.clone(),
            conversations: self.conversations.clone(),
            messages: self.messages.clone(),
            notifications: self.notifications.clone(),
        }
    }
}
