//! Invalidation Coordinator
//!
//! Fixed table from mutating events to the cache keys they make stale.
//! Nothing here runs on its own: every mutation path calls into it once its
//! remote write has completed.
//!
//! | Mutating event | Key(s) invalidated |
//! |---|---|
//! | post created, edited or deleted | `all_posts` |
//! | a user's authored posts change | `user_posts_<uid>` |
//! | posts attributed to an author change | `posts_by_author_<authorName>` |
//! | a post's likes, views, comment count or content change | `post_<postId>` |

use crate::cache::{CacheKey, Clock, PersistentCache};
use crate::storage::Storage;

/// Clears `all_posts`.
pub fn invalidate_posts<S: Storage, C: Clock>(cache: &mut PersistentCache<S, C>) {
    cache.invalidate(&CacheKey::AllPosts);
}

/// Clears `user_posts_<user_id>`. Empty ids are ignored.
pub fn invalidate_user_posts<S: Storage, C: Clock>(cache: &mut PersistentCache<S, C>, user_id: &str) {
    if let Some(key) = CacheKey::user_posts(user_id) {
        cache.invalidate(&key);
    }
}

/// Clears `posts_by_author_<author_name>`. Empty names are ignored.
pub fn invalidate_author_posts<S: Storage, C: Clock>(
    cache: &mut PersistentCache<S, C>,
    author_name: &str,
) {
    if let Some(key) = CacheKey::posts_by_author(author_name) {
        cache.invalidate(&key);
    }
}

/// Clears `post_<post_id>`. Empty ids are ignored.
pub fn invalidate_post_detail<S: Storage, C: Clock>(cache: &mut PersistentCache<S, C>, post_id: &str) {
    if let Some(key) = CacheKey::post(post_id) {
        cache.invalidate(&key);
    }
}

// == Mutation ==
/// Every mutating operation of the client, with the identifiers needed to
/// find the keys it affects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    PostCreated {
        author_id: String,
        author_name: String,
    },
    PostEdited {
        post_id: String,
        author_id: String,
        author_name: String,
    },
    PostDeleted {
        post_id: String,
        author_id: String,
        author_name: String,
    },
    CommentAdded {
        post_id: String,
    },
    CommentDeleted {
        post_id: String,
    },
    /// Comment text lives outside the post document
    CommentEdited {
        post_id: String,
    },
    /// Replies only touch the comment subcollection
    ReplyChanged {
        post_id: String,
    },
    LikeToggled {
        post_id: String,
    },
    ViewRecorded {
        post_id: String,
    },
}

impl Mutation {
    // == Affected Keys ==
    /// Keys made stale by this mutation. Empty identifiers contribute nothing.
    pub fn affected_keys(&self) -> Vec<CacheKey> {
        match self {
            Mutation::PostCreated {
                author_id,
                author_name,
            } => [
                Some(CacheKey::AllPosts),
                CacheKey::user_posts(author_id),
                CacheKey::posts_by_author(author_name),
            ]
            .into_iter()
            .flatten()
            .collect(),
            Mutation::PostEdited {
                post_id,
                author_id,
                author_name,
            }
            | Mutation::PostDeleted {
                post_id,
                author_id,
                author_name,
            } => [
                Some(CacheKey::AllPosts),
                CacheKey::user_posts(author_id),
                CacheKey::posts_by_author(author_name),
                CacheKey::post(post_id),
            ]
            .into_iter()
            .flatten()
            .collect(),
            Mutation::CommentAdded { post_id }
            | Mutation::CommentDeleted { post_id }
            | Mutation::LikeToggled { post_id }
            | Mutation::ViewRecorded { post_id } => CacheKey::post(post_id).into_iter().collect(),
            Mutation::CommentEdited { .. } | Mutation::ReplyChanged { .. } => Vec::new(),
        }
    }
}

// == Invalidate For ==
/// Clears every key affected by `mutation`.
pub fn invalidate_for<S: Storage, C: Clock>(cache: &mut PersistentCache<S, C>, mutation: &Mutation) {
    for key in mutation.affected_keys() {
        cache.invalidate(&key);
    }
}
