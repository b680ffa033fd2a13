//! Mock data for the in-memory backend
//!
//! The bundled fixture is compiled into the binary. Records are inserted in
//! file order and must carry ids 1..n per collection, since the store assigns
//! ids itself and cross-references in the fixture rely on them.
use crate::backend::InMemoryBackend;
use crate::domain::models::{Conversation, Follow, Message, Notification, Post, User};
use anyhow::{ensure, Context, Result};
use record_store::{InMemoryStore, Record};
use serde::Deserialize;
use tracing::info;

const SEED_JSON: &str = include_str!("../fixtures/seed.json");

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub users: Vec<User>,
    pub posts: Vec<Post>,
    pub follows: Vec<Follow>,
    pub conversations: Vec<Conversation>,
    pub messages: Vec<Message>,
    pub notifications: Vec<Notification>,
}

/// Record counts inserted by `populate`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub posts: usize,
    pub follows: usize,
    pub conversations: usize,
    pub messages: usize,
    pub notifications: usize,
}

/// Parse the bundled fixture
pub fn load_fixture() -> Result<Fixture> {
    parse_fixture(SEED_JSON)
}

pub fn parse_fixture(json: &str) -> Result<Fixture> {
    serde_json::from_str(json).context("Failed to parse seed fixture")
}

/// Insert every fixture record into empty collections
pub fn populate(backend: &InMemoryBackend, fixture: Fixture) -> Result<SeedSummary> {
    let summary = SeedSummary {
        users: seed_collection(&backend.users, "users", fixture.users)?,
        posts: seed_collection(&backend.posts, "posts", fixture.posts)?,
        follows: seed_collection(&backend.follows, "follows", fixture.follows)?,
        conversations: seed_collection(
            &backend.conversations,
            "conversations",
            fixture.conversations,
        )?,
        messages: seed_collection(&backend.messages, "messages", fixture.messages)?,
        notifications: seed_collection(
            &backend.notifications,
            "notifications",
            fixture.notifications,
        )?,
    };
    info!(?summary, "backend seeded");
    Ok(summary)
}

fn seed_collection<T: Record>(
    store: &InMemoryStore<T>,
    name: &str,
    records: Vec<T>,
) -> Result<usize> {
    ensure!(store.is_empty(), "{name} collection is already populated");

    let count = records.len();
    for record in records {
        let expected = record.id();
        let stored = store.insert_now(record);
        ensure!(
            stored.id() == expected,
            "{name} fixture ids must run 1..n in order (expected {expected}, assigned {})",
            stored.id()
        );
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use record_store::LatencyConfig;

    #[test]
    fn test_bundled_fixture_is_consistent() {
        let fixture = load_fixture().unwrap();

        for post in &fixture.posts {
            assert!(fixture.users.iter().any(|u| u.id == post.author_id));
        }
        for conv in &fixture.conversations {
            assert_ne!(conv.participant_ids[0], conv.participant_ids[1]);
        }
        for message in &fixture.messages {
            let conv = fixture
                .conversations
                .iter()
                .find(|c| c.id == message.conversation_id)
                .unwrap();
            assert!(conv.has_participant(message.sender_id));
        }
    }

    #[test]
    fn test_populate_keeps_fixture_ids() {
        let backend = InMemoryBackend::new(LatencyConfig::none());
        let summary = populate(&backend, load_fixture().unwrap()).unwrap();

        assert_eq!(summary.users, 6);
        assert_eq!(summary.posts, 6);
        assert_eq!(backend.messages.len(), summary.messages);
        assert!(populate(&backend, load_fixture().unwrap()).is_err());
    }

    #[test]
    fn test_out_of_order_ids_are_rejected() {
        let mut fixture = load_fixture().unwrap();
        fixture.users.swap(0, 1);
        let backend = InMemoryBackend::new(LatencyConfig::none());
        let err = populate(&backend, fixture).unwrap_err();
        assert!(err.to_string().contains("users fixture ids"));
    }
}
