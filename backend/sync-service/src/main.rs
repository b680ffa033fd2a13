use anyhow::{Context, Result};
use sync_service::{
    backend::InMemoryBackend,
    config::Config,
    logging,
    seed,
    services::{MessageFeed, ToggleOutcome},
    state::AppState,
};
use tracing::{info, warn};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Scripted viewer session exercising every coordination component
async fn run_session(app: &AppState) -> Result<()> {
    let viewer = app.viewer_id;

    app.presence.start();

    // Feed + optimistic like
    let feed = app.gateways.posts.get_all().await?;
    app.actions.track_posts(feed.iter().map(|view| &view.post));
    if let Some(first) = feed.iter().find(|view| view.post.author_id != viewer) {
        let post_id = first.post.id;
        let liked = app
            .actions
            .like_state(post_id)
            .map(|state| !state.liked)
            .unwrap_or(true);
        match app.actions.toggle_like(post_id, liked).await {
            Ok(ToggleOutcome::Applied(state)) => {
                info!(post_id, liked = state.liked, likes = state.likes, "like toggled")
            }
            Ok(ToggleOutcome::Ignored) => info!(post_id, "like toggle ignored"),
            Err(e) => warn!(post_id, error = %e, kind = e.kind().as_str(), "like failed"),
        }
    }

    // Follow a suggested user
    app.actions.sync_following(viewer).await?;
    let suggested = app.gateways.users.get_suggested(viewer).await?;
    if let Some(target) = suggested
        .iter()
        .find(|u| !app.actions.is_following(viewer, u.id))
    {
        match app.actions.toggle_follow(viewer, target.id).await {
            Ok(outcome) => info!(target = %target.username, ?outcome, "follow toggled"),
            Err(e) => warn!(error = %e, kind = e.kind().as_str(), "follow failed"),
        }
    }

    // Messages
    let inbox = app.gateways.messages.get_conversations(viewer).await?;
    info!(conversations = inbox.len(), "inbox loaded");
    if let Some(summary) = inbox.first() {
        let conversation = &summary.conversation;
        let mut updates = app.conversations.on_messages_changed(conversation.id);

        let messages = app.conversations.start(conversation.id).await?;
        info!(
            conversation_id = conversation.id,
            messages = messages.len(),
            online = ?app.presence.online_participants(conversation),
            "conversation opened"
        );

        let sent = app
            .conversations
            .send_message(viewer, "On my way, see you there")
            .await?;
        info!(message_id = sent.id, "message sent");

        let marked = app.conversations.mark_read(viewer).await?;
        info!(marked, "conversation marked read");

        while let Ok(update) = updates.try_recv() {
            info!(len = update.len(), "message feed update");
        }
        app.conversations.stop();
    }

    // Notifications
    app.notifications.load().await?;
    info!(unread = app.notifications.unread_count(), "notifications loaded");
    app.notifications.mark_all_read(viewer).await?;
    info!(unread = app.notifications.unread_count(), "notifications reconciled");

    // Search
    for query in ["ai", "#design", "  "] {
        let view = app.search.search(query).await?;
        info!(
            query,
            users = view.users.len(),
            posts = view.posts.len(),
            hashtags = view.hashtags.len(),
            all = view.all.len(),
            "search"
        );
    }

    info!(online = app.presence.online_ids().len(), "session complete");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        poll_interval_ms = config.sync.poll_interval_ms,
        viewer = config.viewer_user_id,
        "starting sync-service"
    );

    let store = InMemoryBackend::new(config.backend.latency());
    let fixture = seed::load_fixture()?;
    seed::populate(&store, fixture)?;

    let app = AppState::new(&store.backend(), &config);

    let result = tokio::select! {
        result = run_session(&app) => result,
        _ = shutdown_signal() => {
            info!("shutdown signal received");
            Ok(())
        }
    };

    app.shutdown();
    result
}
