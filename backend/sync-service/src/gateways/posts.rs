use super::traits::{NewPost, PostsGateway};
use super::join::{author_index, lookup_user};
use crate::domain::hashtags::normalize_tags;
use crate::domain::models::*;
use crate::error::{store_error, EntityKind, SyncError, SyncResult};
use chrono::Utc;
use record_store::RecordStore;
use std::sync::Arc;
use tracing::{debug, info};

/// Posts gateway backed by record stores; joins each post with its author
#[derive(Clone)]
pub struct StorePostsGateway {
    posts: Arc<dyn RecordStore<Post>>,
    users: Arc<dyn RecordStore<User>>,
    trending_limit: usize,
}

impl StorePostsGateway {
    pub fn new(
        posts: Arc<dyn RecordStore<Post>>,
        users: Arc<dyn RecordStore<User>>,
        trending_limit: usize,
    ) -> Self {
        Self {
            posts,
            users,
            trending_limit,
        }
    }

    async fn with_authors(&self, posts: Vec<Post>) -> SyncResult<Vec<PostView>> {
        let authors = author_index(&self.users).await?;
        Ok(posts
            .into_iter()
            .map(|post| PostView {
                author: authors.get(&post.author_id).cloned(),
                post,
            })
            .collect())
    }

    async fn all_posts(&self) -> SyncResult<Vec<Post>> {
        self.posts
            .get_all()
            .await
            .map_err(store_error(EntityKind::Post))
    }
}

/// Newest first; equal timestamps fall back to the higher id
fn newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

fn validate_content(content: &str) -> SyncResult<()> {
    if content.trim().is_empty() {
        return Err(SyncError::Validation("post content cannot be empty".into()));
    }
    if content.chars().count() > MAX_POST_CHARS {
        return Err(SyncError::Validation(format!(
            "post content exceeds {MAX_POST_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_media(media: &[Media]) -> SyncResult<()> {
    if media.len() > MAX_POST_MEDIA {
        return Err(SyncError::Validation(format!(
            "a post carries at most {MAX_POST_MEDIA} attachment"
        )));
    }
    Ok(())
}

#[async_trait::async_trait]
impl PostsGateway for StorePostsGateway {
    async fn get_all(&self) -> SyncResult<Vec<PostView>> {
        let mut posts = self.all_posts().await?;
        newest_first(&mut posts);
        self.with_authors(posts).await
    }

    async fn get_by_id(&self, id: PostId) -> SyncResult<PostView> {
        let post = self
            .posts
            .get_by_id(id)
            .await
            .map_err(store_error(EntityKind::Post))?;
        let author = lookup_user(&self.users, post.author_id).await?;
        Ok(PostView { post, author })
    }

    async fn get_by_user_id(&self, user_id: UserId) -> SyncResult<Vec<PostView>> {
        let mut posts = self
            .posts
            .find(&move |p: &Post| p.author_id == user_id)
            .await
            .map_err(store_error(EntityKind::Post))?;
        newest_first(&mut posts);
        self.with_authors(posts).await
    }

    async fn get_trending(&self) -> SyncResult<Vec<PostView>> {
        let mut posts = self.all_posts().await?;
        // Stable sort keeps id order among equally liked posts
        posts.sort_by(|a, b| b.likes.cmp(&a.likes));
        posts.truncate(self.trending_limit);
        self.with_authors(posts).await
    }

    async fn create(&self, new_post: NewPost) -> SyncResult<Post> {
        validate_content(&new_post.content)?;
        validate_media(&new_post.media)?;

        let post = Post {
            id: 0,
            author_id: new_post.author_id,
            content: new_post.content,
            media: new_post.media,
            hashtags: normalize_tags(new_post.hashtags),
            likes: 0,
            is_liked: false,
            comments: 0,
            created_at: Utc::now(),
        };

        let stored = self
            .posts
            .insert(post)
            .await
            .map_err(store_error(EntityKind::Post))?;
        info!(post_id = stored.id, author_id = stored.author_id, "post created");
        Ok(stored)
    }

    async fn update(&self, id: PostId, update: PostUpdate) -> SyncResult<Post> {
        if let Some(content) = &update.content {
            validate_content(content)?;
        }
        if let Some(media) = &update.media {
            validate_media(media)?;
        }

        self.posts
            .update(
                id,
                Box::new(move |p: &mut Post| {
                    if let Some(content) = update.content {
                        p.content = content;
                    }
                    if let Some(media) = update.media {
                        p.media = media;
                    }
                    if let Some(hashtags) = update.hashtags {
                        p.hashtags = normalize_tags(hashtags);
                    }
                }),
            )
            .await
            .map_err(store_error(EntityKind::Post))
    }

    async fn delete(&self, id: PostId) -> SyncResult<()> {
        self.posts
            .delete(id)
            .await
            .map_err(store_error(EntityKind::Post))
    }

    async fn toggle_like(&self, post_id: PostId, liked: bool) -> SyncResult<Post> {
        debug!(post_id, liked, "writing like state");
        self.posts
            .update(
                post_id,
                Box::new(move |p: &mut Post| {
                    p.likes = if liked {
                        p.likes + 1
                    } else {
                        p.likes.saturating_sub(1)
                    };
                    p.is_liked = liked;
                }),
            )
            .await
            .map_err(store_error(EntityKind::Post))
    }
}
