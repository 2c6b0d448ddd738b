//! Cache Key Module
//!
//! The fixed key namespace: one canonical logical key per cached resource.

use std::fmt;

// == Cache Key ==
/// Logical resource addressed by the cache.
///
/// | Variant | Key |
/// |---|---|
/// | `AllPosts` | `all_posts` |
/// | `UserPosts(uid)` | `user_posts_<uid>` |
/// | `PostsByAuthor(name)` | `posts_by_author_<name>` |
/// | `Post(id)` | `post_<id>` |
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    AllPosts,
    UserPosts(String),
    PostsByAuthor(String),
    Post(String),
}

impl CacheKey {
    /// Key for the posts written by user `uid`, None when `uid` is empty.
    pub fn user_posts(uid: &str) -> Option<Self> {
        non_empty(uid).map(|uid| Self::UserPosts(uid.to_string()))
    }

    /// Key for the posts attributed to `author_name`, None when empty.
    pub fn posts_by_author(author_name: &str) -> Option<Self> {
        non_empty(author_name).map(|name| Self::PostsByAuthor(name.to_string()))
    }

    /// Key for a single post's detail, None when `post_id` is empty.
    pub fn post(post_id: &str) -> Option<Self> {
        non_empty(post_id).map(|id| Self::Post(id.to_string()))
    }

    /// Canonical logical key string.
    pub fn as_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::AllPosts => write!(f, "all_posts"),
            CacheKey::UserPosts(uid) => write!(f, "user_posts_{}", uid),
            CacheKey::PostsByAuthor(name) => write!(f, "posts_by_author_{}", name),
            CacheKey::Post(id) => write!(f, "post_{}", id),
        }
    }
}

fn non_empty(id: &str) -> Option<&str> {
    (!id.is_empty()).then_some(id)
}
