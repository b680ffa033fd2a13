//! Hashtag extraction and normalization
//!
//! Tags are `#` followed by one or more word characters (alphanumeric or `_`).
//! Stored tags are lowercase, without the leading `#`, and unique per post.

/// Extract hashtags from post text, lowercased and de-duplicated in order of appearance.
///
/// ```
/// use sync_service::domain::hashtags::extract_hashtags;
///
/// assert_eq!(
///     extract_hashtags("Shipping #Rust today #rust #async_io!"),
///     vec!["rust".to_string(), "async_io".to_string()]
/// );
/// ```
pub fn extract_hashtags(content: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut chars = content.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '#' {
            continue;
        }
        let mut tag = String::new();
        while let Some(&(_, next)) = chars.peek() {
            if next.is_alphanumeric() || next == '_' {
                tag.push(next);
                chars.next();
            } else {
                break;
            }
        }
        if !tag.is_empty() {
            tags.push(tag);
        }
    }

    normalize_tags(tags)
}

/// Lowercase, strip a leading `#`, drop empties and duplicates (first occurrence wins).
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim().trim_start_matches('#').to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

/// Search needle for hashtag comparison: lowercase with one leading `#` removed.
pub fn tag_needle(query: &str) -> String {
    let lower = query.to_lowercase();
    match lower.strip_prefix('#') {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}
