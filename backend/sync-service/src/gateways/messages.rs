use super::join::{author_index, lookup_user};
use super::traits::MessagesGateway;
use crate::domain::models::*;
use crate::error::{store_error, EntityKind, SyncError, SyncResult};
use chrono::Utc;
use record_store::{InsertOutcome, RecordStore};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Conversation display order: `created_at` ascending, id as tiebreak.
/// Ids are assigned monotonically, so the tiebreak matches insertion order.
pub fn chronological(messages: &mut [Message]) {
    messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

/// Messages/conversations gateway backed by record stores
#[derive(Clone)]
pub struct StoreMessagesGateway {
    conversations: Arc<dyn RecordStore<Conversation>>,
    messages: Arc<dyn RecordStore<Message>>,
    users: Arc<dyn RecordStore<User>>,
}

impl StoreMessagesGateway {
    pub fn new(
        conversations: Arc<dyn RecordStore<Conversation>>,
        messages: Arc<dyn RecordStore<Message>>,
        users: Arc<dyn RecordStore<User>>,
    ) -> Self {
        Self {
            conversations,
            messages,
            users,
        }
    }
}

#[async_trait::async_trait]
impl MessagesGateway for StoreMessagesGateway {
    async fn get_conversations(&self, user_id: UserId) -> SyncResult<Vec<ConversationSummary>> {
        let conversations = self
            .conversations
            .find(&move |c: &Conversation| c.has_participant(user_id))
            .await
            .map_err(store_error(EntityKind::Conversation))?;

        let ids: HashSet<ConversationId> = conversations.iter().map(|c| c.id).collect();
        let messages = self
            .messages
            .find(&move |m: &Message| ids.contains(&m.conversation_id))
            .await
            .map_err(store_error(EntityKind::Message))?;

        let mut latest: HashMap<ConversationId, Message> = HashMap::new();
        for message in messages {
            let newer = latest
                .get(&message.conversation_id)
                .map_or(true, |current| {
                    (current.created_at, current.id) < (message.created_at, message.id)
                });
            if newer {
                latest.insert(message.conversation_id, message);
            }
        }

        let users = author_index(&self.users).await?;
        let mut summaries: Vec<ConversationSummary> = conversations
            .into_iter()
            .map(|conversation| ConversationSummary {
                participants: conversation
                    .participant_ids
                    .iter()
                    .filter_map(|id| users.get(id).cloned())
                    .collect(),
                last_message: latest.remove(&conversation.id),
                conversation,
            })
            .collect();

        summaries.sort_by(|a, b| {
            b.last_activity()
                .cmp(&a.last_activity())
                .then(b.conversation.id.cmp(&a.conversation.id))
        });
        Ok(summaries)
    }

    async fn get_conversation(&self, id: ConversationId) -> SyncResult<Conversation> {
        self.conversations
            .get_by_id(id)
            .await
            .map_err(store_error(EntityKind::Conversation))
    }

    async fn get_messages(&self, conversation_id: ConversationId) -> SyncResult<Vec<Message>> {
        let mut messages = self
            .messages
            .find(&move |m: &Message| m.conversation_id == conversation_id)
            .await
            .map_err(store_error(EntityKind::Message))?;
        chronological(&mut messages);
        Ok(messages)
    }

    async fn send_message(&self, new_message: NewMessage) -> SyncResult<Message> {
        if new_message.content.trim().is_empty() {
            return Err(SyncError::Validation("message content cannot be empty".into()));
        }

        let conversation = self.get_conversation(new_message.conversation_id).await?;
        if !conversation.has_participant(new_message.sender_id) {
            return Err(SyncError::Validation(format!(
                "user {} is not a participant of conversation {}",
                new_message.sender_id, conversation.id
            )));
        }

        let message = Message {
            id: 0,
            conversation_id: conversation.id,
            sender_id: new_message.sender_id,
            content: new_message.content,
            message_type: new_message.message_type,
            is_read: false,
            created_at: Utc::now(),
            read_at: None,
        };
        let stored = self
            .messages
            .insert(message)
            .await
            .map_err(store_error(EntityKind::Message))?;

        let sent_at = stored.created_at;
        if let Err(e) = self
            .conversations
            .update(
                conversation.id,
                Box::new(move |c: &mut Conversation| c.updated_at = sent_at),
            )
            .await
        {
            // The message itself is stored; a stale updated_at only affects inbox order
            warn!(conversation_id = conversation.id, error = %e, "failed to bump conversation");
        }

        debug!(
            conversation_id = stored.conversation_id,
            message_id = stored.id,
            "message stored"
        );
        Ok(stored)
    }

    async fn create_conversation(
        &self,
        user_a: UserId,
        user_b: UserId,
    ) -> SyncResult<ConversationSummary> {
        if user_a == user_b {
            return Err(SyncError::Validation(
                "a conversation needs two distinct participants".into(),
            ));
        }

        let now = Utc::now();
        let conversation = Conversation {
            id: 0,
            participant_ids: [user_a, user_b],
            created_at: now,
            updated_at: now,
        };
        let outcome = self
            .conversations
            .insert_unless(conversation, &move |c: &Conversation| {
                c.is_between(user_a, user_b)
            })
            .await
            .map_err(store_error(EntityKind::Conversation))?;

        let conversation = match outcome {
            InsertOutcome::Inserted(conversation) => {
                info!(conversation_id = conversation.id, user_a, user_b, "conversation created");
                conversation
            }
            InsertOutcome::Existing(conversation) => conversation,
        };

        let mut participants = Vec::with_capacity(conversation.participant_ids.len());
        for id in conversation.participant_ids {
            if let Some(user) = lookup_user(&self.users, id).await? {
                participants.push(user);
            }
        }
        Ok(ConversationSummary {
            conversation,
            participants,
            last_message: None,
        })
    }

    async fn mark_as_read(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> SyncResult<usize> {
        self.get_conversation(conversation_id).await?;

        let read_at = Utc::now();
        self.messages
            .update_where(
                &move |m: &Message| {
                    m.conversation_id == conversation_id && m.sender_id != user_id && !m.is_read
                },
                &move |m: &mut Message| {
                    m.is_read = true;
                    m.read_at = Some(read_at);
                },
            )
            .await
            .map_err(store_error(EntityKind::Message))
    }

    async fn delete_conversation(&self, conversation_id: ConversationId) -> SyncResult<()> {
        self.get_conversation(conversation_id).await?;

        // Messages first: a conversation is never removed while messages still reference it
        let removed = self
            .messages
            .delete_where(&move |m: &Message| m.conversation_id == conversation_id)
            .await
            .map_err(store_error(EntityKind::Message))?;
        self.conversations
            .delete(conversation_id)
            .await
            .map_err(store_error(EntityKind::Conversation))?;
        info!(conversation_id, removed, "conversation deleted");
        Ok(())
    }
}
