/// Conversation sync poller
///
/// Keeps the message list of the selected conversation fresh by re-fetching it
/// on a fixed interval. The backend list is authoritative and already ordered;
/// a fetch replaces the view only when it is longer than what is displayed.
///
/// Lifecycle is explicit: `start(conversation_id)` selects a conversation and
/// spawns the poll loop, `stop()` closes it. Every selection bumps a generation
/// counter, and a fetch whose generation no longer matches is discarded on
/// arrival, so a late response never touches a conversation that is no longer
/// selected.
use super::subscription::{MessageFeed, SubscriptionRegistry};
use crate::domain::models::{ConversationId, Message, MessageType, NewMessage, UserId};
use crate::error::{SyncError, SyncResult};
use crate::gateways::messages::chronological;
use crate::gateways::MessagesGateway;
use crate::workers::BackgroundTask;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc::UnboundedReceiver, watch};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Per-conversation sync state machine:
/// `Idle -> Loading -> Synced -> Loading -> Synced ... -> Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Loading,
    Synced,
    Closed,
}

/// Outcome of merging a fetched list into the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Replaced { len: usize },
    Unchanged,
    Stale,
}

struct PollerState {
    conversation_id: Option<ConversationId>,
    generation: u64,
    phase: SyncPhase,
    messages: Vec<Message>,
    task: Option<BackgroundTask>,
}

struct PollerInner {
    gateway: Arc<dyn MessagesGateway>,
    interval: Duration,
    state: Mutex<PollerState>,
    // Serializes fetches so a poll is never issued while another is outstanding
    fetch_lock: tokio::sync::Mutex<()>,
    subscribers: SubscriptionRegistry,
}

pub struct ConversationSyncPoller {
    inner: Arc<PollerInner>,
}

impl ConversationSyncPoller {
    pub fn new(gateway: Arc<dyn MessagesGateway>, interval: Duration) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                gateway,
                interval,
                state: Mutex::new(PollerState {
                    conversation_id: None,
                    generation: 0,
                    phase: SyncPhase::Idle,
                    messages: Vec::new(),
                    task: None,
                }),
                fetch_lock: tokio::sync::Mutex::new(()),
                subscribers: SubscriptionRegistry::new(),
            }),
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.inner.state.lock().phase
    }

    pub fn active_conversation(&self) -> Option<ConversationId> {
        self.inner.state.lock().conversation_id
    }

    /// Current view, oldest first
    pub fn messages(&self) -> Vec<Message> {
        self.inner.state.lock().messages.clone()
    }

    pub fn is_polling(&self) -> bool {
        self.inner
            .state
            .lock()
            .task
            .as_ref()
            .map(BackgroundTask::is_running)
            .unwrap_or(false)
    }

    /// Select a conversation: load its messages and start polling.
    ///
    /// Any previous selection is closed first. The initial load is
    /// user-initiated, so its failure is returned to the caller.
    pub async fn start(&self, conversation_id: ConversationId) -> SyncResult<Vec<Message>> {
        let generation = {
            let mut state = self.inner.state.lock();
            state.task = None;
            state.generation += 1;
            state.conversation_id = Some(conversation_id);
            state.phase = SyncPhase::Loading;
            state.messages.clear();
            state.generation
        };
        info!(conversation_id, generation, "conversation selected");

        let fetched = {
            let _fetch = self.inner.fetch_lock.lock().await;
            self.inner.gateway.get_messages(conversation_id).await
        };

        let mut state = self.inner.state.lock();
        if state.generation != generation {
            debug!(conversation_id, "initial load arrived after deselection");
            return Err(SyncError::Cancelled(conversation_id));
        }

        let mut messages = match fetched {
            Ok(messages) => messages,
            Err(e) => {
                state.phase = SyncPhase::Idle;
                warn!(conversation_id, error = %e, "initial message load failed");
                return Err(e);
            }
        };
        chronological(&mut messages);
        state.messages = messages.clone();
        state.phase = SyncPhase::Synced;

        let inner = self.inner.clone();
        state.task = Some(BackgroundTask::spawn(move |shutdown| {
            poll_loop(inner, conversation_id, generation, shutdown)
        }));
        drop(state);

        self.inner.subscribers.publish(conversation_id, &messages);
        Ok(messages)
    }

    /// Close the current conversation, cancelling its timer and any in-flight fetch
    pub fn stop(&self) {
        let mut state = self.inner.state.lock();
        state.generation += 1;
        state.task = None;
        state.messages.clear();
        state.phase = SyncPhase::Closed;
        if let Some(conversation_id) = state.conversation_id.take() {
            info!(conversation_id, "conversation closed");
        }
    }

    /// Out-of-cycle fetch, outside the timer. Errors are returned to the caller.
    pub async fn refresh(&self) -> SyncResult<MergeOutcome> {
        let (conversation_id, generation) = self.inner.selection()?;
        let outcome = self.inner.fetch_and_merge(conversation_id, generation).await?;
        if outcome == MergeOutcome::Stale {
            return Err(SyncError::Cancelled(conversation_id));
        }
        Ok(outcome)
    }

    /// Send a text message to the selected conversation, then pull the
    /// confirmed copy with an immediate refresh. Nothing is appended locally.
    pub async fn send_message(&self, sender_id: UserId, content: &str) -> SyncResult<Message> {
        let (conversation_id, _) = self.inner.selection()?;
        let sent = self
            .inner
            .gateway
            .send_message(NewMessage {
                conversation_id,
                sender_id,
                content: content.to_string(),
                message_type: MessageType::Text,
            })
            .await?;

        if let Err(e) = self.refresh().await {
            debug!(conversation_id, error = %e, "refresh after send did not apply");
        }
        Ok(sent)
    }

    /// Mark the other participant's messages read, remotely and in the view
    pub async fn mark_read(&self, viewer_id: UserId) -> SyncResult<usize> {
        let (conversation_id, generation) = self.inner.selection()?;
        let marked = self
            .inner
            .gateway
            .mark_as_read(conversation_id, viewer_id)
            .await?;

        let mut state = self.inner.state.lock();
        if state.generation == generation {
            let read_at = chrono::Utc::now();
            for message in state
                .messages
                .iter_mut()
                .filter(|m| m.sender_id != viewer_id && !m.is_read)
            {
                message.is_read = true;
                message.read_at = Some(read_at);
            }
        }
        Ok(marked)
    }
}

impl PollerInner {
    fn selection(&self) -> SyncResult<(ConversationId, u64)> {
        let state = self.state.lock();
        state
            .conversation_id
            .map(|id| (id, state.generation))
            .ok_or_else(|| SyncError::Validation("no conversation selected".into()))
    }

    async fn fetch_and_merge(
        &self,
        conversation_id: ConversationId,
        generation: u64,
    ) -> SyncResult<MergeOutcome> {
        let _fetch = self.fetch_lock.lock().await;
        {
            let mut state = self.state.lock();
            if state.generation != generation {
                return Ok(MergeOutcome::Stale);
            }
            state.phase = SyncPhase::Loading;
        }

        let fetched = self.gateway.get_messages(conversation_id).await;

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(conversation_id, generation, "discarding stale fetch");
            return Ok(MergeOutcome::Stale);
        }
        state.phase = SyncPhase::Synced;

        let mut messages = fetched?;
        if messages.len() <= state.messages.len() {
            return Ok(MergeOutcome::Unchanged);
        }

        chronological(&mut messages);
        let len = messages.len();
        debug!(
            conversation_id,
            previous = state.messages.len(),
            len,
            "message view replaced"
        );
        state.messages = messages;
        let snapshot = state.messages.clone();
        drop(state);

        self.subscribers.publish(conversation_id, &snapshot);
        Ok(MergeOutcome::Replaced { len })
    }
}

impl MessageFeed for ConversationSyncPoller {
    fn on_messages_changed(
        &self,
        conversation_id: ConversationId,
    ) -> UnboundedReceiver<Vec<Message>> {
        let snapshot = {
            let state = self.inner.state.lock();
            let loaded = state.phase == SyncPhase::Synced || !state.messages.is_empty();
            (state.conversation_id == Some(conversation_id) && loaded)
                .then(|| state.messages.clone())
        };
        self.inner.subscribers.subscribe(conversation_id, snapshot)
    }
}

impl Drop for ConversationSyncPoller {
    fn drop(&mut self) {
        self.inner.state.lock().task = None;
    }
}

/// Background poll loop; the interval re-arms only after the previous fetch settles
async fn poll_loop(
    inner: Arc<PollerInner>,
    conversation_id: ConversationId,
    generation: u64,
    mut shutdown: watch::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                debug!(conversation_id, "poll loop shutting down");
                break;
            }
            _ = sleep(inner.interval) => {
                match inner.fetch_and_merge(conversation_id, generation).await {
                    Ok(MergeOutcome::Stale) => break,
                    Ok(_) => {}
                    // Background failures keep the stale view
                    Err(e) => debug!(conversation_id, error = %e, "background poll failed"),
                }
            }
        }
    }
}
