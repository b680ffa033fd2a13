mod common;

use common::{settle, Harness};
use record_store::RecordStore;
use std::sync::Arc;
use std::time::Duration;
use sync_service::domain::models::NewMessage;
use sync_service::error::{ErrorKind, SyncError};
use sync_service::services::{ConversationSyncPoller, MergeOutcome, MessageFeed, SyncPhase};

const INTERVAL: Duration = Duration::from_secs(3);

fn poller(h: &Harness) -> Arc<ConversationSyncPoller> {
    Arc::new(ConversationSyncPoller::new(h.gateways.messages.clone(), INTERVAL))
}

fn ids(poller: &ConversationSyncPoller) -> Vec<u64> {
    poller.messages().iter().map(|m| m.id).collect()
}

#[tokio::test(start_paused = true)]
async fn test_start_loads_messages_in_chronological_order() {
    let h = Harness::instant();
    let conv = h.add_conversation(1, 2);
    let late = h.add_message(conv.id, 1, "third", 5);
    let early = h.add_message(conv.id, 2, "first", 0);
    let tie = h.add_message(conv.id, 1, "second", 0);
    h.add_message(h.add_conversation(1, 3).id, 3, "elsewhere", 1);

    let poller = poller(&h);
    assert_eq!(poller.phase(), SyncPhase::Idle);

    let loaded = poller.start(conv.id).await.unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(ids(&poller), vec![early.id, tie.id, late.id]);
    assert_eq!(poller.phase(), SyncPhase::Synced);
    assert_eq!(poller.active_conversation(), Some(conv.id));
    assert!(poller.is_polling());
    poller.stop();
}

#[tokio::test(start_paused = true)]
async fn test_poll_picks_up_new_messages_and_never_shrinks() {
    let h = Harness::instant();
    let conv = h.add_conversation(1, 2);
    let first = h.add_message(conv.id, 2, "hi", 0);
    let poller = poller(&h);
    poller.start(conv.id).await.unwrap();

    let mut lengths = vec![poller.messages().len()];

    h.add_message(conv.id, 2, "are you there?", 1);
    tokio::time::sleep(INTERVAL + Duration::from_millis(100)).await;
    lengths.push(poller.messages().len());

    // A shorter authoritative list is not applied
    h.store.messages.delete(first.id).await.unwrap();
    tokio::time::sleep(INTERVAL).await;
    lengths.push(poller.messages().len());

    h.add_message(conv.id, 1, "yes", 2);
    h.add_message(conv.id, 1, "sorry", 3);
    tokio::time::sleep(INTERVAL).await;
    lengths.push(poller.messages().len());

    assert_eq!(lengths, vec![1, 2, 2, 3]);
    assert!(lengths.windows(2).all(|w| w[0] <= w[1]));

    let messages = poller.messages();
    assert!(messages
        .windows(2)
        .all(|w| (w[0].created_at, w[0].id) < (w[1].created_at, w[1].id)));
    poller.stop();
}

#[tokio::test(start_paused = true)]
async fn test_stop_discards_in_flight_fetch() {
    let h = Harness::with_latency();
    let conv = h.add_conversation(1, 2);
    h.add_message(conv.id, 2, "hi", 0);
    let poller = poller(&h);
    poller.start(conv.id).await.unwrap();

    h.add_message(conv.id, 2, "new", 1);
    // The poll fires 3s after the initial load; its read takes another 200ms
    tokio::time::sleep(INTERVAL + Duration::from_millis(100)).await;
    poller.stop();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(poller.phase(), SyncPhase::Closed);
    assert!(poller.messages().is_empty());
    assert_eq!(poller.active_conversation(), None);
    assert!(!poller.is_polling());
}

#[tokio::test(start_paused = true)]
async fn test_switching_conversation_ignores_previous_responses() {
    let h = Harness::with_latency();
    let first = h.add_conversation(1, 2);
    let second = h.add_conversation(1, 3);
    h.add_message(first.id, 2, "from first", 0);
    let only = h.add_message(second.id, 3, "from second", 0);
    let poller = poller(&h);
    poller.start(first.id).await.unwrap();

    h.add_message(first.id, 2, "late", 1);
    tokio::time::sleep(INTERVAL + Duration::from_millis(100)).await;
    poller.start(second.id).await.unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(poller.active_conversation(), Some(second.id));
    assert_eq!(ids(&poller), vec![only.id]);
    poller.stop();
}

#[tokio::test(start_paused = true)]
async fn test_initial_load_cancelled_by_stop() {
    let h = Harness::with_latency();
    let conv = h.add_conversation(1, 2);
    let poller = poller(&h);

    let load = {
        let poller = poller.clone();
        tokio::spawn(async move { poller.start(conv.id).await })
    };
    settle().await;
    poller.stop();

    let err = load.await.unwrap().unwrap_err();
    assert_eq!(err, SyncError::Cancelled(conv.id));
    assert_eq!(poller.phase(), SyncPhase::Closed);
    assert!(!poller.is_polling());
}

#[tokio::test(start_paused = true)]
async fn test_send_refreshes_out_of_cycle() {
    let h = Harness::instant();
    let conv = h.add_conversation(1, 2);
    let poller = Arc::new(ConversationSyncPoller::new(
        h.gateways.messages.clone(),
        Duration::from_secs(60),
    ));
    poller.start(conv.id).await.unwrap();

    let sent = poller.send_message(1, "hello there").await.unwrap();

    assert!(sent.id > 0);
    assert!(!sent.is_read);
    assert_eq!(ids(&poller), vec![sent.id]);
    assert_eq!(poller.messages()[0].content, "hello there");
    poller.stop();
}

#[tokio::test(start_paused = true)]
async fn test_send_failure_is_surfaced() {
    let h = Harness::instant();
    let conv = h.add_conversation(1, 2);
    let poller = poller(&h);
    poller.start(conv.id).await.unwrap();

    let err = poller.send_message(3, "not a participant").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    h.store.messages.fail_next(1);
    let err = poller.send_message(1, "boom").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transient);
    assert!(poller.messages().is_empty());
    poller.stop();
}

#[tokio::test(start_paused = true)]
async fn test_initial_load_failure_is_surfaced() {
    let h = Harness::instant();
    let conv = h.add_conversation(1, 2);
    let poller = poller(&h);

    h.store.messages.fail_next(1);
    let err = poller.start(conv.id).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transient);
    assert_eq!(poller.phase(), SyncPhase::Idle);
    assert!(!poller.is_polling());
}

#[tokio::test(start_paused = true)]
async fn test_background_poll_failure_keeps_stale_view() {
    let h = Harness::instant();
    let conv = h.add_conversation(1, 2);
    h.add_message(conv.id, 2, "hi", 0);
    let poller = poller(&h);
    poller.start(conv.id).await.unwrap();

    h.add_message(conv.id, 2, "missed once", 1);
    h.store.messages.fail_next(1);
    tokio::time::sleep(INTERVAL + Duration::from_millis(100)).await;

    assert_eq!(poller.messages().len(), 1);
    assert_eq!(poller.phase(), SyncPhase::Synced);
    assert!(poller.is_polling());

    tokio::time::sleep(INTERVAL).await;
    assert_eq!(poller.messages().len(), 2);
    poller.stop();
}

#[tokio::test(start_paused = true)]
async fn test_refresh_requires_selection() {
    let h = Harness::instant();
    let poller = poller(&h);

    let err = poller.refresh().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(poller.send_message(1, "hi").await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_refresh_reports_merge_outcome() {
    let h = Harness::instant();
    let conv = h.add_conversation(1, 2);
    let poller = poller(&h);
    poller.start(conv.id).await.unwrap();

    assert_eq!(poller.refresh().await.unwrap(), MergeOutcome::Unchanged);
    h.add_message(conv.id, 2, "ping", 0);
    assert_eq!(
        poller.refresh().await.unwrap(),
        MergeOutcome::Replaced { len: 1 }
    );
    poller.stop();
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_receive_snapshot_and_updates() {
    let h = Harness::instant();
    let conv = h.add_conversation(1, 2);
    h.add_message(conv.id, 2, "hi", 0);
    let poller = poller(&h);

    let mut early = poller.on_messages_changed(conv.id);
    poller.start(conv.id).await.unwrap();
    let mut late = poller.on_messages_changed(conv.id);

    assert_eq!(early.recv().await.unwrap().len(), 1);
    assert_eq!(late.recv().await.unwrap().len(), 1);

    h.gateways
        .messages
        .send_message(NewMessage {
            conversation_id: conv.id,
            sender_id: 2,
            content: "anyone?".into(),
            message_type: Default::default(),
        })
        .await
        .unwrap();
    tokio::time::sleep(INTERVAL + Duration::from_millis(100)).await;

    assert_eq!(early.recv().await.unwrap().len(), 2);
    assert_eq!(late.recv().await.unwrap().len(), 2);
    assert!(early.try_recv().is_err());
    poller.stop();
}

#[tokio::test(start_paused = true)]
async fn test_mark_read_updates_backend_and_view() {
    let h = Harness::instant();
    let conv = h.add_conversation(1, 2);
    h.add_message(conv.id, 2, "one", 0);
    h.add_message(conv.id, 2, "two", 1);
    h.add_message(conv.id, 1, "mine", 2);
    let poller = poller(&h);
    poller.start(conv.id).await.unwrap();

    assert_eq!(poller.mark_read(1).await.unwrap(), 2);

    for message in poller.messages() {
        assert_eq!(message.is_read, message.sender_id == 2);
    }
    let stored = h.gateways.messages.get_messages(conv.id).await.unwrap();
    assert!(stored.iter().filter(|m| m.sender_id == 2).all(|m| m.is_read));
    assert!(stored.iter().filter(|m| m.sender_id == 2).all(|m| m.read_at.is_some()));

    // Nothing left to mark
    assert_eq!(poller.mark_read(1).await.unwrap(), 0);
    poller.stop();
}
