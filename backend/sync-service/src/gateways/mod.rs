//! Entity gateways: query/command facades over the persistence backend.
//!
//! Coordination components depend only on the traits in [`traits`]; the
//! `Store*` implementations translate them onto `RecordStore` operations and
//! perform the cross-entity joins.
mod join;

pub mod follows;
pub mod messages;
pub mod notifications;
pub mod posts;
pub mod search;
pub mod traits;
pub mod users;

pub use follows::StoreFollowsGateway;
pub use messages::StoreMessagesGateway;
pub use notifications::StoreNotificationsGateway;
pub use posts::StorePostsGateway;
pub use search::StoreSearchGateway;
pub use traits::*;
pub use users::StoreUsersGateway;

use crate::backend::Backend;
use crate::config::Config;
use std::sync::Arc;

/// One handle per gateway, shared by the coordination components
#[derive(Clone)]
pub struct Gateways {
    pub users: Arc<dyn UsersGateway>,
    pub posts: Arc<dyn PostsGateway>,
    pub follows: Arc<dyn FollowsGateway>,
    pub messages: Arc<dyn MessagesGateway>,
    pub notifications: Arc<dyn NotificationsGateway>,
    pub search: Arc<dyn SearchGateway>,
}

impl Gateways {
    pub fn new(backend: &Backend, config: &Config) -> Self {
        Self {
            users: Arc::new(StoreUsersGateway::new(
                backend.users.clone(),
                config.feed.suggested_limit,
            )),
            posts: Arc::new(StorePostsGateway::new(
                backend.posts.clone(),
                backend.users.clone(),
                config.feed.trending_limit,
            )),
            follows: Arc::new(StoreFollowsGateway::new(backend.follows.clone())),
            messages: Arc::new(StoreMessagesGateway::new(
                backend.conversations.clone(),
                backend.messages.clone(),
                backend.users.clone(),
            )),
            notifications: Arc::new(StoreNotificationsGateway::new(
                backend.notifications.clone(),
                backend.users.clone(),
            )),
            search: Arc::new(StoreSearchGateway::new(
                backend.users.clone(),
                backend.posts.clone(),
                config.search.clone(),
            )),
        }
    }
}
