use crate::config::SearchConfig;
use crate::domain::models::{HashtagCount, PostView, SearchResults, User};
use crate::error::SyncResult;
use crate::gateways::SearchGateway;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Slice sizes of the combined "all" view
pub const ALL_VIEW_USERS: usize = 3;
pub const ALL_VIEW_POSTS: usize = 5;
pub const ALL_VIEW_HASHTAGS: usize = 3;

/// One entry of the combined view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SearchHit {
    User(User),
    Post(PostView),
    Hashtag(HashtagCount),
}

/// Partitioned search result: bounded per-category lists plus the "all" slice
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchView {
    pub query: String,
    pub users: Vec<User>,
    pub posts: Vec<PostView>,
    pub hashtags: Vec<HashtagCount>,
    /// First users, then posts, then hashtags; a display slice, not a relevance merge
    pub all: Vec<SearchHit>,
}

impl SearchView {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.posts.is_empty() && self.hashtags.is_empty()
    }

    fn from_results(query: &str, mut results: SearchResults, limits: &SearchConfig) -> Self {
        results.users.truncate(limits.max_users);
        results.posts.truncate(limits.max_posts);
        results.hashtags.truncate(limits.max_hashtags);

        let all = results
            .users
            .iter()
            .take(ALL_VIEW_USERS)
            .cloned()
            .map(SearchHit::User)
            .chain(
                results
                    .posts
                    .iter()
                    .take(ALL_VIEW_POSTS)
                    .cloned()
                    .map(SearchHit::Post),
            )
            .chain(
                results
                    .hashtags
                    .iter()
                    .take(ALL_VIEW_HASHTAGS)
                    .cloned()
                    .map(SearchHit::Hashtag),
            )
            .collect();

        Self {
            query: query.to_string(),
            users: results.users,
            posts: results.posts,
            hashtags: results.hashtags,
            all,
        }
    }
}

pub struct SearchAggregator {
    gateway: Arc<dyn SearchGateway>,
    limits: SearchConfig,
}

impl SearchAggregator {
    pub fn new(gateway: Arc<dyn SearchGateway>, limits: SearchConfig) -> Self {
        Self { gateway, limits }
    }

    /// Run a free-text query. A blank query returns an empty view without
    /// touching the backend; gateway errors propagate unchanged.
    pub async fn search(&self, raw: &str) -> SyncResult<SearchView> {
        if raw.trim().is_empty() {
            return Ok(SearchView {
                query: raw.to_string(),
                ..Default::default()
            });
        }

        let results = self.gateway.search(raw).await?;
        let view = SearchView::from_results(raw, results, &self.limits);
        debug!(
            query = raw,
            users = view.users.len(),
            posts = view.posts.len(),
            hashtags = view.hashtags.len(),
            "search aggregated"
        );
        Ok(view)
    }
}
