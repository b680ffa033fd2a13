//! Free-text matching rules shared by the search gateway
//!
//! Content and hashtag matching are independent passes: a post is a hit if
//! its text contains the query OR one of its tags contains the hash-stripped
//! query. Hashtag counts reflect global tag popularity, not query relevance.
use super::hashtags::tag_needle;
use super::models::{HashtagCount, Post, User};
use std::collections::HashMap;

/// Normalized form of a raw query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Lowercased query, used for user and post-content matching
    pub text: String,
    /// Lowercased query with a leading `#` removed, used for hashtag matching
    pub tag: String,
}

impl SearchQuery {
    /// Returns `None` for empty or whitespace-only input.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return None;
        }
        Some(Self {
            text: raw.to_lowercase(),
            tag: tag_needle(raw),
        })
    }
}

pub fn user_matches(user: &User, query: &SearchQuery) -> bool {
    user.display_name.to_lowercase().contains(&query.text)
        || user.username.to_lowercase().contains(&query.text)
        || user
            .bio
            .as_ref()
            .map(|bio| bio.to_lowercase().contains(&query.text))
            .unwrap_or(false)
}

pub fn post_matches_content(post: &Post, query: &SearchQuery) -> bool {
    post.content.to_lowercase().contains(&query.text)
}

pub fn post_matches_tag(post: &Post, query: &SearchQuery) -> bool {
    post.has_tag_containing(&query.tag)
}

pub fn post_matches(post: &Post, query: &SearchQuery) -> bool {
    post_matches_content(post, query) || post_matches_tag(post, query)
}

/// Count tag occurrences across `posts` for every tag matching the query.
///
/// Tags are reported in order of first appearance. Every post bearing a
/// matching tag is counted, whether or not that post matched the query.
pub fn tally_hashtags<'a, I>(posts: I, query: &SearchQuery) -> Vec<HashtagCount>
where
    I: IntoIterator<Item = &'a Post>,
{
    let mut tallies: Vec<HashtagCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for post in posts {
        for tag in &post.hashtags {
            if let Some(&slot) = index.get(tag) {
                tallies[slot].posts_count += 1;
            } else if tag.to_lowercase().contains(&query.tag) {
                index.insert(tag.clone(), tallies.len());
                tallies.push(HashtagCount {
                    name: tag.clone(),
                    posts_count: 1,
                });
            }
        }
    }

    tallies
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post(id: u64, content: &str, tags: &[&str]) -> Post {
        Post {
            id,
            author_id: 1,
            content: content.to_string(),
            media: Vec::new(),
            hashtags: tags.iter().map(|t| t.to_string()).collect(),
            likes: 0,
            is_liked: false,
            comments: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_blank_query_is_rejected() {
        assert!(SearchQuery::parse("").is_none());
        assert!(SearchQuery::parse("   \t").is_none());
    }

    #[test]
    fn test_content_and_tag_passes_are_independent() {
        let q = SearchQuery::parse("ai").unwrap();
        let tagged = post(1, "New model release", &["ai"]);
        let untagged = post(2, "Tickets available now", &[]);
        let neither = post(3, "Coffee", &["morning"]);

        assert!(!post_matches_content(&tagged, &q));
        assert!(post_matches_tag(&tagged, &q));
        assert!(post_matches_content(&untagged, &q));
        assert!(!post_matches_tag(&untagged, &q));
        assert!(!post_matches(&neither, &q));
    }

    #[test]
    fn test_hash_prefix_only_affects_tag_pass() {
        let q = SearchQuery::parse("#Rust").unwrap();
        assert_eq!(q.text, "#rust");
        assert_eq!(q.tag, "rust");
        assert!(post_matches(&post(1, "plain text", &["rustlang"]), &q));
        assert!(!post_matches(&post(2, "I like rust", &[]), &q));
    }

    #[test]
    fn test_tally_counts_global_popularity() {
        let q = SearchQuery::parse("des").unwrap();
        let posts = vec![
            post(1, "a", &["design", "ux"]),
            post(2, "b", &["ux"]),
            post(3, "c", &["design"]),
            post(4, "d", &["webdesign", "design"]),
        ];
        let tallies = tally_hashtags(&posts, &q);
        assert_eq!(
            tallies,
            vec![
                HashtagCount { name: "design".into(), posts_count: 3 },
                HashtagCount { name: "webdesign".into(), posts_count: 1 },
            ]
        );
    }
}
