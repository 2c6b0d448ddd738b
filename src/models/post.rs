//! Post, comment and reply records.

use serde::{Deserialize, Serialize};

// == Post ==
/// A blog post as stored in the `posts` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    /// Unix milliseconds
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub liked_by: Vec<String>,
}

impl Post {
    /// True when `uid` is in the post's like list.
    pub fn is_liked_by(&self, uid: &str) -> bool {
        self.liked_by.iter().any(|u| u == uid)
    }

    // == Matches ==
    /// True when every keyword occurs in the lowercased title, content and
    /// author name. Keywords must already be lowercase.
    pub fn matches(&self, keywords: &[String]) -> bool {
        let haystack = [&self.title, &self.content, &self.author_name]
            .iter()
            .map(|field| field.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        keywords.iter().all(|word| haystack.contains(word.as_str()))
    }
}

/// Splits a search term into lowercase keywords.
pub fn keywords(search: &str) -> Vec<String> {
    search
        .split_whitespace()
        .map(|word| word.to_lowercase())
        .collect()
}

// == Comment ==
/// Comment in `posts/<postId>/comments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub reply_count: i64,
}

// == Reply ==
/// Reply in `posts/<postId>/comments/<commentId>/replies`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub parent_comment_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> Post {
        Post {
            id: "p1".to_string(),
            title: "Rust Ownership".to_string(),
            content: "Borrowing explained".to_string(),
            author_id: "u1".to_string(),
            author_name: "Ada Lovelace".to_string(),
            created_at: None,
            views: 0,
            likes: 0,
            comment_count: 0,
            liked_by: vec!["u2".to_string()],
        }
    }

    #[test]
    fn test_keywords_lowercase_and_split() {
        assert_eq!(keywords("  Rust   ADA "), vec!["rust", "ada"]);
        assert!(keywords("   ").is_empty());
    }

    #[test]
    fn test_matches_requires_every_keyword() {
        let post = post();
        assert!(post.matches(&keywords("rust ada")));
        assert!(post.matches(&keywords("BORROW")));
        assert!(!post.matches(&keywords("rust python")));
        assert!(post.matches(&[]));
    }

    #[test]
    fn test_is_liked_by() {
        let post = post();
        assert!(post.is_liked_by("u2"));
        assert!(!post.is_liked_by("u1"));
    }

    #[test]
    fn test_decode_with_missing_counters() {
        let post: Post = serde_json::from_str(
            r#"{"id":"p9","title":"t","content":"c","authorName":"a","createdAt":5}"#,
        )
        .unwrap();
        assert_eq!(post.views, 0);
        assert_eq!(post.comment_count, 0);
        assert!(post.liked_by.is_empty());
        assert_eq!(post.created_at, Some(5));
    }

    #[test]
    fn test_encode_uses_store_field_names() {
        let raw = serde_json::to_value(post()).unwrap();
        assert!(raw.get("authorName").is_some());
        assert!(raw.get("commentCount").is_some());
        assert!(raw.get("likedBy").is_some());
    }
}
