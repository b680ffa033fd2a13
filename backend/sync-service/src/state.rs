use crate::backend::Backend;
use crate::config::Config;
use crate::domain::models::UserId;
use crate::gateways::Gateways;
use crate::services::{
    ConversationSyncPoller, NotificationReconciler, OptimisticActionCoordinator, SearchAggregator,
};
use crate::workers::PresenceTracker;
use std::sync::Arc;

/// Everything one signed-in viewer needs, wired over a single backend
#[derive(Clone)]
pub struct AppState {
    pub viewer_id: UserId,
    pub gateways: Gateways,
    pub actions: Arc<OptimisticActionCoordinator>,
    pub conversations: Arc<ConversationSyncPoller>,
    pub presence: Arc<PresenceTracker>,
    pub notifications: Arc<NotificationReconciler>,
    pub search: Arc<SearchAggregator>,
}

impl AppState {
    pub fn new(backend: &Backend, config: &Config) -> Self {
        let gateways = Gateways::new(backend, config);
        let viewer_id = config.viewer_user_id;

        Self {
            viewer_id,
            actions: Arc::new(OptimisticActionCoordinator::new(
                gateways.posts.clone(),
                gateways.follows.clone(),
            )),
            conversations: Arc::new(ConversationSyncPoller::new(
                gateways.messages.clone(),
                config.sync.poll_interval(),
            )),
            presence: Arc::new(PresenceTracker::new(
                gateways.users.clone(),
                config.sync.presence_interval(),
            )),
            notifications: Arc::new(NotificationReconciler::new(
                gateways.notifications.clone(),
                viewer_id,
            )),
            search: Arc::new(SearchAggregator::new(
                gateways.search.clone(),
                config.search.clone(),
            )),
            gateways,
        }
    }

    /// Stop every background loop; switching accounts or shutting down
    pub fn shutdown(&self) {
        self.conversations.stop();
        self.presence.stop();
    }
}
