use super::traits::SearchGateway;
use crate::config::SearchConfig;
use crate::domain::models::*;
use crate::domain::search::{post_matches, tally_hashtags, user_matches, SearchQuery};
use crate::error::{store_error, EntityKind, SyncResult};
use record_store::RecordStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Search gateway scanning the users and posts collections
#[derive(Clone)]
pub struct StoreSearchGateway {
    users: Arc<dyn RecordStore<User>>,
    posts: Arc<dyn RecordStore<Post>>,
    limits: SearchConfig,
}

impl StoreSearchGateway {
    pub fn new(
        users: Arc<dyn RecordStore<User>>,
        posts: Arc<dyn RecordStore<Post>>,
        limits: SearchConfig,
    ) -> Self {
        Self {
            users,
            posts,
            limits,
        }
    }
}

#[async_trait::async_trait]
impl SearchGateway for StoreSearchGateway {
    async fn search(&self, raw: &str) -> SyncResult<SearchResults> {
        let Some(query) = SearchQuery::parse(raw) else {
            return Ok(SearchResults::default());
        };

        let (users, posts) = futures::try_join!(
            async {
                self.users
                    .get_all()
                    .await
                    .map_err(store_error(EntityKind::User))
            },
            async {
                self.posts
                    .get_all()
                    .await
                    .map_err(store_error(EntityKind::Post))
            },
        )?;

        let authors: HashMap<UserId, User> = users.iter().map(|u| (u.id, u.clone())).collect();
        let mut hashtags = tally_hashtags(&posts, &query);
        hashtags.truncate(self.limits.max_hashtags);

        let mut matched_users: Vec<User> = users
            .into_iter()
            .filter(|u| user_matches(u, &query))
            .collect();
        matched_users.truncate(self.limits.max_users);

        let mut matched_posts: Vec<Post> = posts
            .into_iter()
            .filter(|p| post_matches(p, &query))
            .collect();
        matched_posts.truncate(self.limits.max_posts);

        let posts = matched_posts
            .into_iter()
            .map(|post| PostView {
                author: authors.get(&post.author_id).cloned(),
                post,
            })
            .collect::<Vec<_>>();

        debug!(
            query = %query.text,
            users = matched_users.len(),
            posts = posts.len(),
            hashtags = hashtags.len(),
            "search completed"
        );

        Ok(SearchResults {
            users: matched_users,
            posts,
            hashtags,
        })
    }
}
