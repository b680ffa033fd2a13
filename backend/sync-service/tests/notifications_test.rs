mod common;

use common::Harness;
use sync_service::domain::models::NotificationType;
use sync_service::error::{ErrorKind, SyncError};
use sync_service::gateways::NewNotification;
use sync_service::services::NotificationReconciler;

fn seeded() -> (Harness, NotificationReconciler) {
    let h = Harness::instant();
    let viewer = h.add_user("viewer", true);
    let actor = h.add_user("actor", false);
    h.add_notification(viewer.id, actor.id, NotificationType::Like, 0, false);
    h.add_notification(viewer.id, actor.id, NotificationType::Follow, 30, true);
    h.add_notification(viewer.id, actor.id, NotificationType::Mention, 10, false);
    h.add_notification(actor.id, viewer.id, NotificationType::Comment, 5, false);

    let reconciler = NotificationReconciler::new(h.gateways.notifications.clone(), viewer.id);
    (h, reconciler)
}

#[tokio::test]
async fn test_load_orders_newest_first_and_derives_unread() {
    let (_h, reconciler) = seeded();
    assert_eq!(reconciler.load().await.unwrap(), 3);

    let items = reconciler.notifications();
    let kinds: Vec<_> = items
        .iter()
        .map(|item| item.notification.notification_type)
        .collect();
    assert_eq!(
        kinds,
        vec![
            NotificationType::Follow,
            NotificationType::Mention,
            NotificationType::Like
        ]
    );
    assert!(items.iter().all(|item| item.actor.is_some()));
    assert_eq!(reconciler.unread_count(), 2);
}

#[tokio::test]
async fn test_mark_all_read_then_reload_has_no_unread() {
    let (h, reconciler) = seeded();
    reconciler.load().await.unwrap();

    let touched = reconciler.mark_all_read(reconciler.user_id()).await.unwrap();
    assert_eq!(touched, 2);
    assert_eq!(reconciler.unread_count(), 0);

    let remote = h
        .gateways
        .notifications
        .get_by_user_id(reconciler.user_id())
        .await
        .unwrap();
    assert!(remote.iter().all(|item| item.notification.read));

    reconciler.load().await.unwrap();
    assert_eq!(reconciler.unread_count(), 0);

    // Other users' notifications are untouched, and a repeat is harmless
    let other = h.gateways.notifications.get_by_user_id(2).await.unwrap();
    assert!(!other[0].notification.read);
    assert_eq!(reconciler.mark_all_read(reconciler.user_id()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_mark_one_read() {
    let (_h, reconciler) = seeded();
    reconciler.load().await.unwrap();
    let target = reconciler
        .notifications()
        .into_iter()
        .find(|item| !item.notification.read)
        .unwrap();

    let confirmed = reconciler
        .mark_one_read(target.notification.id)
        .await
        .unwrap();

    assert!(confirmed.read);
    assert_eq!(reconciler.unread_count(), 1);
}

#[tokio::test]
async fn test_mark_one_read_unknown_id() {
    let (_h, reconciler) = seeded();
    reconciler.load().await.unwrap();

    let err = reconciler.mark_one_read(999).await.unwrap_err();
    assert_eq!(err, SyncError::NotificationNotFound(999));
    assert_eq!(err.kind(), ErrorKind::NotificationNotFound);
    assert_eq!(reconciler.unread_count(), 2);
}

#[tokio::test]
async fn test_backend_failure_leaves_local_state_alone() {
    let (h, reconciler) = seeded();
    reconciler.load().await.unwrap();

    h.store.notifications.fail_next(1);
    let err = reconciler
        .mark_all_read(reconciler.user_id())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transient);
    assert_eq!(reconciler.unread_count(), 2);
}

#[tokio::test]
async fn test_created_notification_appears_unread() {
    let (h, reconciler) = seeded();
    let created = h
        .gateways
        .notifications
        .create(NewNotification {
            user_id: reconciler.user_id(),
            actor_id: 2,
            notification_type: NotificationType::Like,
            target_id: Some(7),
        })
        .await
        .unwrap();

    reconciler.load().await.unwrap();
    let newest = &reconciler.notifications()[0];
    assert_eq!(newest.notification.id, created.id);
    assert!(!newest.notification.read);
    assert_eq!(reconciler.unread_count(), 3);
}
