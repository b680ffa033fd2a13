mod common;

use common::Harness;
use sync_service::domain::models::HashtagCount;
use sync_service::error::ErrorKind;
use sync_service::services::search::{ALL_VIEW_HASHTAGS, ALL_VIEW_POSTS, ALL_VIEW_USERS};
use sync_service::services::{SearchAggregator, SearchHit};

fn aggregator(h: &Harness) -> SearchAggregator {
    SearchAggregator::new(h.gateways.search.clone(), h.config.search.clone())
}

#[tokio::test]
async fn test_hashtag_and_content_passes_are_independent() {
    let h = Harness::instant();
    let author = h.add_user("marcus", false);
    let tagged = h.add_post(author.id, "New model release", &["ai"], 0);
    let available = h.add_post(author.id, "Tickets available now", &[], 0);
    let unrelated = h.add_post(author.id, "Coffee first", &["morning"], 0);

    let view = aggregator(&h).search("AI").await.unwrap();
    let post_ids: Vec<u64> = view.posts.iter().map(|p| p.post.id).collect();

    // Tag hit without "ai" in the text
    assert!(post_ids.contains(&tagged.id));
    // "available" literally contains "ai"
    assert!(post_ids.contains(&available.id));
    assert!(!post_ids.contains(&unrelated.id));
    assert!(view.posts.iter().all(|p| p.author.as_ref().map(|a| a.id) == Some(author.id)));
    assert_eq!(
        view.hashtags,
        vec![HashtagCount {
            name: "ai".into(),
            posts_count: 1
        }]
    );
}

#[tokio::test]
async fn test_hash_prefix_only_applies_to_tags() {
    let h = Harness::instant();
    let tagged = h.add_post(1, "plain words", &["rust"], 0);
    h.add_post(1, "I write rust daily", &[], 0);

    let view = aggregator(&h).search("#rust").await.unwrap();
    let post_ids: Vec<u64> = view.posts.iter().map(|p| p.post.id).collect();
    assert_eq!(post_ids, vec![tagged.id]);
}

#[tokio::test]
async fn test_blank_query_skips_backend() {
    let h = Harness::instant();
    h.add_user("someone", false);
    h.store.users.fail_next(1);

    let view = aggregator(&h).search("   ").await.unwrap();
    assert!(view.is_empty());
    assert!(view.all.is_empty());

    // The pending fault proves nothing was fetched; it surfaces on a real query
    let err = aggregator(&h).search("some").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transient);
}

#[tokio::test]
async fn test_users_match_name_username_or_bio() {
    let h = Harness::instant();
    let mut by_bio = common::user("zed", false);
    by_bio.bio = Some("Landscape PHOTOGRAPHER".into());
    let by_bio = h.store.users.insert_now(by_bio);
    let mut by_name = common::user("x1", false);
    by_name.display_name = "Photo Booth".into();
    let by_name = h.store.users.insert_now(by_name);
    h.add_user("nobody", false);

    let view = aggregator(&h).search("photo").await.unwrap();
    let user_ids: Vec<u64> = view.users.iter().map(|u| u.id).collect();
    assert_eq!(user_ids, vec![by_bio.id, by_name.id]);
}

#[tokio::test]
async fn test_categories_are_bounded_and_all_view_is_sliced() {
    let h = Harness::instant();
    for i in 0..25 {
        let name = format!("pulse{i}");
        let author = h.add_user(&name, false);
        h.add_post(author.id, &format!("pulse update {i}"), &[name.as_str()], 0);
    }

    let view = aggregator(&h).search("pulse").await.unwrap();

    assert_eq!(view.users.len(), 20);
    assert_eq!(view.posts.len(), 20);
    assert_eq!(view.hashtags.len(), 10);
    assert_eq!(
        view.all.len(),
        ALL_VIEW_USERS + ALL_VIEW_POSTS + ALL_VIEW_HASHTAGS
    );

    assert!(view.all[..3].iter().all(|hit| matches!(hit, SearchHit::User(_))));
    assert!(view.all[3..8].iter().all(|hit| matches!(hit, SearchHit::Post(_))));
    assert!(view.all[8..].iter().all(|hit| matches!(hit, SearchHit::Hashtag(_))));
    assert_eq!(view.all[0], SearchHit::User(view.users[0].clone()));
    assert_eq!(view.all[8], SearchHit::Hashtag(view.hashtags[0].clone()));
}

#[tokio::test]
async fn test_hashtag_counts_reflect_global_popularity() {
    let h = Harness::instant();
    h.add_post(1, "one", &["design", "ux"], 0);
    h.add_post(1, "two", &["ux"], 0);
    h.add_post(1, "three", &["design"], 0);
    h.add_post(1, "four", &["webdesign", "design"], 0);

    let view = aggregator(&h).search("des").await.unwrap();
    assert_eq!(
        view.hashtags,
        vec![
            HashtagCount {
                name: "design".into(),
                posts_count: 3
            },
            HashtagCount {
                name: "webdesign".into(),
                posts_count: 1
            },
        ]
    );
}
