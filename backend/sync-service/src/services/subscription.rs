//! Per-conversation subscriber registry
use crate::domain::models::{ConversationId, Message};
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Source of message-list updates for a conversation.
///
/// Each receiver gets the full ordered list whenever it changes. Polling and a
/// push transport can both sit behind this.
pub trait MessageFeed: Send + Sync {
    fn on_messages_changed(&self, conversation_id: ConversationId)
        -> UnboundedReceiver<Vec<Message>>;
}

/// conversation_id -> live senders; dead senders are dropped on the next publish
#[derive(Default)]
pub struct SubscriptionRegistry {
    inner: Mutex<HashMap<ConversationId, Vec<UnboundedSender<Vec<Message>>>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a receiver; a `snapshot` is delivered to it before any later update
    pub fn subscribe(
        &self,
        conversation_id: ConversationId,
        snapshot: Option<Vec<Message>>,
    ) -> UnboundedReceiver<Vec<Message>> {
        let (tx, rx) = unbounded_channel();
        if let Some(messages) = snapshot {
            let _ = tx.send(messages);
        }

        let mut guard = self.inner.lock();
        let subscribers = guard.entry(conversation_id).or_default();
        subscribers.push(tx);
        debug!(
            conversation_id,
            subscribers = subscribers.len(),
            "message subscriber added"
        );
        rx
    }

    /// Broadcast to every subscriber of the conversation; returns how many received it
    pub fn publish(&self, conversation_id: ConversationId, messages: &[Message]) -> usize {
        let mut guard = self.inner.lock();
        let Some(subscribers) = guard.get_mut(&conversation_id) else {
            return 0;
        };

        subscribers.retain(|tx| tx.send(messages.to_vec()).is_ok());
        let delivered = subscribers.len();
        if subscribers.is_empty() {
            guard.remove(&conversation_id);
            debug!(conversation_id, "removed empty subscriber list");
        }
        delivered
    }

    pub fn subscriber_count(&self, conversation_id: ConversationId) -> usize {
        self.inner
            .lock()
            .get(&conversation_id)
            .map(|subs| subs.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}
