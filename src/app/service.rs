//! Application service
//!
//! Read paths (cache first, store on miss) and mutation paths (store write,
//! then invalidation) of the blogging client.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::app::{AppState, PostCard};
use crate::cache::{invalidate_for, CacheKey, Clock, Mutation, PersistentCache, SystemClock};
use crate::config::{Config, ALL_POSTS_TTL_MS};
use crate::error::{AppError, Result, StoreError};
use crate::models::{keywords, Comment, Message, Post, Reply, User};
use crate::remote::{decode_all, fields, paths, Direction, DocumentStore, Patch, Query};
use crate::storage::Storage;

const CREATED_AT: &str = "createdAt";

// == App ==
/// State-owning client: remote store, persistent cache and application state.
pub struct App<D, S, C = SystemClock> {
    store: D,
    cache: PersistentCache<S, C>,
    state: AppState,
    all_posts_ttl: Duration,
}

impl<D: DocumentStore, S: Storage, C: Clock> App<D, S, C> {
    // == Constructor ==
    pub fn new(store: D, cache: PersistentCache<S, C>) -> Self {
        Self {
            store,
            cache,
            state: AppState::new(),
            all_posts_ttl: Duration::from_millis(ALL_POSTS_TTL_MS),
        }
    }

    /// Creates an app whose listing TTL comes from `config`.
    pub fn with_config(store: D, cache: PersistentCache<S, C>, config: &Config) -> Self {
        let mut app = Self::new(store, cache);
        app.all_posts_ttl = config.all_posts_ttl();
        app
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn cache(&self) -> &PersistentCache<S, C> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut PersistentCache<S, C> {
        &mut self.cache
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    /// Current time in Unix milliseconds, from the cache clock.
    pub fn now_ms(&self) -> i64 {
        i64::try_from(self.cache.clock().now_ms()).unwrap_or(i64::MAX)
    }

    // == Auth ==
    /// Records the new identity and reloads the listing, signed in or not.
    pub async fn on_auth_state_changed(&mut self, user: Option<User>) -> Result<()> {
        match &user {
            Some(user) => info!("Signed in as {}", user.uid),
            None => info!("Signed out"),
        }
        self.state.set_current_user(user);
        self.load_posts("").await?;
        Ok(())
    }

    // == Load Posts ==
    /// Loads the global listing, newest first.
    ///
    /// Without a search term the cached `all_posts` listing is used when
    /// valid; on a miss it is fetched from the server and cached with the
    /// listing TTL. A search always goes to the server and keeps the posts
    /// containing every keyword. A failed fetch leaves both the cache and the
    /// previous listing untouched.
    pub async fn load_posts(&mut self, search: &str) -> Result<&[Post]> {
        let words = keywords(search);
        let query = Query::collection(paths::POSTS)
            .order_by(CREATED_AT, Direction::Descending)
            .from_server();

        let posts = if words.is_empty() {
            let key = CacheKey::AllPosts.as_key();
            match self.cache.get::<Vec<Post>>(&key) {
                Some(posts) => posts,
                None => {
                    let posts = self.fetch_posts(&query).await?;
                    self.cache.set(&key, &posts, Some(self.all_posts_ttl));
                    posts
                }
            }
        } else {
            let posts = self.fetch_posts(&query).await?;
            posts.into_iter().filter(|p| p.matches(&words)).collect()
        };

        debug!("Loaded {} posts", posts.len());
        self.state.set_posts(posts);
        Ok(self.state.posts())
    }

    /// Posts written by user `uid`, cached under `user_posts_<uid>`.
    pub async fn load_user_posts(&mut self, uid: &str) -> Result<Vec<Post>> {
        let Some(key) = CacheKey::user_posts(uid) else {
            return Ok(Vec::new());
        };
        let query = Query::collection(paths::POSTS)
            .where_eq("authorId", uid)
            .order_by(CREATED_AT, Direction::Descending)
            .from_server();
        self.cached_posts(&key, &query).await
    }

    /// Posts attributed to `author_name`, cached under `posts_by_author_<name>`.
    pub async fn load_author_posts(&mut self, author_name: &str) -> Result<Vec<Post>> {
        let Some(key) = CacheKey::posts_by_author(author_name) else {
            return Ok(Vec::new());
        };
        let query = Query::collection(paths::POSTS)
            .where_eq("authorName", author_name)
            .order_by(CREATED_AT, Direction::Descending)
            .from_server();
        self.cached_posts(&key, &query).await
    }

    /// A single post, cached under `post_<id>`.
    pub async fn load_post(&mut self, post_id: &str) -> Result<Post> {
        let key = CacheKey::post(post_id)
            .ok_or_else(|| AppError::PostNotFound(post_id.to_string()))?
            .as_key();

        if let Some(post) = self.cache.get::<Post>(&key) {
            return Ok(post);
        }

        let document = self
            .store
            .get_document(&paths::post(post_id))
            .await?
            .ok_or_else(|| AppError::PostNotFound(post_id.to_string()))?;
        let post: Post = document.decode()?;
        self.cache.set(&key, &post, None);
        Ok(post)
    }

    // == Open Post Detail ==
    /// Opens a post from the listing and counts a view.
    ///
    /// Every open counts, revisits included. A failed counter update is
    /// logged and the local count still goes up.
    pub async fn open_post_detail(&mut self, post_id: &str) -> Result<&Post> {
        if self.state.find_post(post_id).is_none() {
            return Err(AppError::PostNotFound(post_id.to_string()));
        }

        if let Err(e) = self
            .store
            .increment_field(&paths::post(post_id), "views", 1)
            .await
        {
            warn!("Error incrementing view count for {}: {}", post_id, e);
        }
        invalidate_for(
            &mut self.cache,
            &Mutation::ViewRecorded {
                post_id: post_id.to_string(),
            },
        );

        let opened = self.state.find_post_mut(post_id).map(|post| {
            post.views += 1;
            post.clone()
        });
        self.state.set_current_post(opened);
        self.state
            .current_post()
            .ok_or_else(|| AppError::PostNotFound(post_id.to_string()))
    }

    // == Posts ==
    /// Publishes a new post and returns its id.
    pub async fn create_post(&mut self, title: &str, content: &str) -> Result<String> {
        let user = self.require_user("Please login to create a post.")?;
        let title = require_text(title, "Please enter a title.")?;
        let content = require_text(content, "Please enter some content.")?;

        let document = fields(json!({
            "title": title,
            "content": content,
            "authorId": user.uid,
            "authorName": user.handle(),
            "createdAt": self.now_ms(),
            "views": 0,
            "likes": 0,
            "commentCount": 0,
            "likedBy": [],
        }));
        let result = self.store.add_document(paths::POSTS, document).await;

        invalidate_for(
            &mut self.cache,
            &Mutation::PostCreated {
                author_id: user.uid.clone(),
                author_name: user.handle(),
            },
        );
        let id = result?;
        info!("Created post {}", id);
        Ok(id)
    }

    /// Replaces the title and content of a post.
    pub async fn edit_post(&mut self, post_id: &str, title: &str, content: &str) -> Result<()> {
        let user = self.require_user("Please login to edit a post.")?;
        let title = require_text(title, "Please enter a title.")?;
        let content = require_text(content, "Post content cannot be empty.")?;

        let store = &self.store;
        let path = paths::post(post_id);
        let (author_id, author_name, result) = match store.get_document(&path).await {
            Ok(Some(document)) => {
                let (author_id, author_name) = document_author(&document.fields, &user);
                let patch = Patch::set(fields(json!({ "title": title, "content": content })));
                (author_id, author_name, store.apply_patch(&path, patch).await)
            }
            Ok(None) => (
                user.uid.clone(),
                user.handle(),
                Err(StoreError::NotFound(path.clone())),
            ),
            Err(e) => (user.uid.clone(), user.handle(), Err(e)),
        };

        invalidate_for(
            &mut self.cache,
            &Mutation::PostEdited {
                post_id: post_id.to_string(),
                author_id,
                author_name,
            },
        );
        result?;

        if let Some(post) = self.state.find_post_mut(post_id) {
            post.title = title.to_string();
            post.content = content.to_string();
        }
        if let Some(post) = self.state.current_post_mut(post_id) {
            post.title = title.to_string();
            post.content = content.to_string();
        }
        Ok(())
    }

    /// Deletes a post.
    pub async fn delete_post(&mut self, post_id: &str) -> Result<()> {
        let user = self.require_user("Please login to delete a post.")?;

        let store = &self.store;
        let path = paths::post(post_id);
        let (author_id, author_name, result) = match store.get_document(&path).await {
            Ok(Some(document)) => {
                let (author_id, author_name) = document_author(&document.fields, &user);
                (author_id, author_name, store.delete_document(&path).await)
            }
            Ok(None) => (user.uid.clone(), user.handle(), Ok(())),
            Err(e) => (user.uid.clone(), user.handle(), Err(e)),
        };

        invalidate_for(
            &mut self.cache,
            &Mutation::PostDeleted {
                post_id: post_id.to_string(),
                author_id,
                author_name,
            },
        );
        result?;

        self.state.remove_post(post_id);
        Ok(())
    }

    // == Comments ==
    /// Comments of a post, newest first.
    pub async fn load_comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        let query =
            Query::collection(paths::comments(post_id)).order_by(CREATED_AT, Direction::Descending);
        let documents = self.store.fetch_ordered(&query).await?;
        Ok(decode_all(&documents)?)
    }

    /// Adds a comment and bumps the post's comment counter.
    pub async fn add_comment(&mut self, post_id: &str, content: &str) -> Result<()> {
        let user = self.require_user("Please login to comment.")?;
        let content = require_text(content, "Please enter a comment.")?;

        let document = fields(json!({
            "content": content,
            "authorId": user.uid,
            "authorName": user.handle(),
            "createdAt": self.now_ms(),
            "replyCount": 0,
        }));
        let store = &self.store;
        let result = async {
            store.add_document(&paths::comments(post_id), document).await?;
            store
                .increment_field(&paths::post(post_id), "commentCount", 1)
                .await
        }
        .await;

        invalidate_for(
            &mut self.cache,
            &Mutation::CommentAdded {
                post_id: post_id.to_string(),
            },
        );
        result?;

        if let Some(post) = self.state.current_post_mut(post_id) {
            post.comment_count += 1;
        }
        Ok(())
    }

    /// Replaces a comment's text.
    pub async fn edit_comment(&mut self, post_id: &str, comment_id: &str, content: &str) -> Result<()> {
        self.require_user("Please login to edit a comment.")?;
        let content = require_text(content, "Comment cannot be empty.")?;

        let result = self
            .store
            .apply_patch(
                &paths::comment(post_id, comment_id),
                Patch::set(fields(json!({ "content": content }))),
            )
            .await;

        invalidate_for(
            &mut self.cache,
            &Mutation::CommentEdited {
                post_id: post_id.to_string(),
            },
        );
        Ok(result?)
    }

    /// Deletes a comment and lowers the post's comment counter.
    pub async fn delete_comment(&mut self, post_id: &str, comment_id: &str) -> Result<()> {
        self.require_user("Please login to delete a comment.")?;

        let store = &self.store;
        let result = async {
            store
                .delete_document(&paths::comment(post_id, comment_id))
                .await?;
            store
                .increment_field(&paths::post(post_id), "commentCount", -1)
                .await
        }
        .await;

        invalidate_for(
            &mut self.cache,
            &Mutation::CommentDeleted {
                post_id: post_id.to_string(),
            },
        );
        result?;

        if let Some(post) = self.state.current_post_mut(post_id) {
            post.comment_count = (post.comment_count - 1).max(0);
        }
        Ok(())
    }

    // == Replies ==
    /// Replies to a comment, oldest first, always from the server.
    pub async fn load_replies(&self, post_id: &str, comment_id: &str) -> Result<Vec<Reply>> {
        let query = Query::collection(paths::replies(post_id, comment_id))
            .order_by(CREATED_AT, Direction::Ascending)
            .from_server();
        let documents = self.store.fetch_ordered(&query).await?;
        Ok(decode_all(&documents)?)
    }

    /// Adds a reply and bumps the parent comment's reply counter.
    pub async fn add_reply(&mut self, post_id: &str, comment_id: &str, content: &str) -> Result<()> {
        let user = self.require_user("Please login to reply.")?;
        let content = require_text(content, "Please enter a reply.")?;

        let document = fields(json!({
            "content": content,
            "authorId": user.uid,
            "authorName": user.handle(),
            "createdAt": self.now_ms(),
            "parentCommentId": comment_id,
        }));
        let store = &self.store;
        let result = async {
            store
                .add_document(&paths::replies(post_id, comment_id), document)
                .await?;
            store
                .increment_field(&paths::comment(post_id, comment_id), "replyCount", 1)
                .await
        }
        .await;

        invalidate_for(
            &mut self.cache,
            &Mutation::ReplyChanged {
                post_id: post_id.to_string(),
            },
        );
        Ok(result?)
    }

    /// Replaces a reply's text.
    pub async fn edit_reply(
        &mut self,
        post_id: &str,
        comment_id: &str,
        reply_id: &str,
        content: &str,
    ) -> Result<()> {
        self.require_user("Please login to edit a reply.")?;
        let content = require_text(content, "Reply cannot be empty.")?;

        let result = self
            .store
            .apply_patch(
                &paths::reply(post_id, comment_id, reply_id),
                Patch::set(fields(json!({ "content": content }))),
            )
            .await;

        invalidate_for(
            &mut self.cache,
            &Mutation::ReplyChanged {
                post_id: post_id.to_string(),
            },
        );
        Ok(result?)
    }

    /// Deletes a reply and lowers the parent comment's reply counter.
    pub async fn delete_reply(&mut self, post_id: &str, comment_id: &str, reply_id: &str) -> Result<()> {
        self.require_user("Please login to delete a reply.")?;

        let store = &self.store;
        let result = async {
            store
                .delete_document(&paths::reply(post_id, comment_id, reply_id))
                .await?;
            store
                .increment_field(&paths::comment(post_id, comment_id), "replyCount", -1)
                .await
        }
        .await;

        invalidate_for(
            &mut self.cache,
            &Mutation::ReplyChanged {
                post_id: post_id.to_string(),
            },
        );
        Ok(result?)
    }

    // == Likes ==
    /// Likes or unlikes a post for the current user. Returns whether the post
    /// is now liked.
    pub async fn toggle_like(&mut self, post_id: &str) -> Result<bool> {
        let user = self.require_user("Please login to like posts.")?;

        let store = &self.store;
        let path = paths::post(post_id);
        let result: std::result::Result<(bool, Vec<String>), StoreError> = async {
            let document = store
                .get_document(&path)
                .await?
                .ok_or_else(|| StoreError::NotFound(path.clone()))?;
            let post: Post = document.decode()?;

            let was_liked = post.is_liked_by(&user.uid);
            let mut liked_by = post.liked_by;
            if was_liked {
                liked_by.retain(|uid| uid != &user.uid);
            } else {
                liked_by.push(user.uid.clone());
            }

            let patch = Patch::set(fields(json!({ "likedBy": liked_by })))
                .increment("likes", if was_liked { -1 } else { 1 });
            store.apply_patch(&path, patch).await?;
            Ok((!was_liked, liked_by))
        }
        .await;

        invalidate_for(
            &mut self.cache,
            &Mutation::LikeToggled {
                post_id: post_id.to_string(),
            },
        );
        let (liked, liked_by) = result?;

        if let Some(post) = self.state.current_post_mut(post_id) {
            post.likes = if liked { post.likes + 1 } else { (post.likes - 1).max(0) };
            post.liked_by = liked_by;
        }
        Ok(liked)
    }

    // == Messaging ==
    /// Sends a direct message. Ignored when signed out or when blank.
    pub async fn send_message(&self, receiver_id: &str, content: &str) -> Result<()> {
        let Some(user) = self.state.current_user() else {
            return Ok(());
        };
        let content = content.trim();
        if content.is_empty() {
            return Ok(());
        }

        let document = fields(json!({
            "sender": user.uid,
            "receiver": receiver_id,
            "content": content,
            "createdAt": self.now_ms(),
        }));
        self.store.add_document(paths::MESSAGES, document).await?;
        Ok(())
    }

    /// Conversation with `other_user_id`, oldest first. Empty when signed out.
    pub async fn fetch_messages_with(&self, other_user_id: &str) -> Result<Vec<Message>> {
        let Some(user) = self.state.current_user() else {
            return Ok(Vec::new());
        };

        let participants = vec![Value::from(user.uid.as_str()), Value::from(other_user_id)];
        let query = Query::collection(paths::MESSAGES)
            .where_in("sender", participants.clone())
            .where_in("receiver", participants)
            .order_by(CREATED_AT, Direction::Ascending)
            .from_server();
        let documents = self.store.fetch_ordered(&query).await?;
        Ok(decode_all(&documents)?)
    }

    // == Views ==
    /// Cards for the loaded listing, as seen by the current user.
    pub fn post_cards(&self) -> Vec<PostCard> {
        let viewer = self.state.current_user().map(|u| u.uid.as_str());
        let now = self.now_ms();
        self.state
            .posts()
            .iter()
            .map(|post| PostCard::new(post, viewer, now))
            .collect()
    }

    // == Helpers ==
    async fn fetch_posts(&self, query: &Query) -> Result<Vec<Post>> {
        let documents = self.store.fetch_ordered(query).await.map_err(|e| {
            warn!("Error loading posts: {}", e);
            e
        })?;
        Ok(decode_all(&documents)?)
    }

    async fn cached_posts(&mut self, key: &CacheKey, query: &Query) -> Result<Vec<Post>> {
        let key = key.as_key();
        if let Some(posts) = self.cache.get::<Vec<Post>>(&key) {
            return Ok(posts);
        }
        let posts = self.fetch_posts(query).await?;
        self.cache.set(&key, &posts, None);
        Ok(posts)
    }

    fn require_user(&self, message: &str) -> Result<User> {
        self.state
            .current_user()
            .cloned()
            .ok_or_else(|| AppError::NotAuthenticated(message.to_string()))
    }
}

/// Trimmed `text`, or `EmptyContent` with `message` when nothing is left.
fn require_text<'a>(text: &'a str, message: &str) -> Result<&'a str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::EmptyContent(message.to_string()));
    }
    Ok(text)
}

/// Author id and name recorded on a post document, falling back to `user`.
fn document_author(fields: &crate::remote::Fields, user: &User) -> (String, String) {
    let read = |name: &str| fields.get(name).and_then(Value::as_str).map(str::to_string);
    (
        read("authorId").unwrap_or_else(|| user.uid.clone()),
        read("authorName").unwrap_or_else(|| user.handle()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::remote::{Document, Fields, MemoryDocumentStore};
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use tokio_test::{assert_err, assert_ok};

    type StoreResult<T> = std::result::Result<T, StoreError>;

    type TestApp = App<MemoryDocumentStore, MemoryStorage, ManualClock>;

    const T0: u64 = 1_700_000_000_000;

    async fn seeded_app() -> TestApp {
        let store = MemoryDocumentStore::new();
        store
            .insert(
                "posts/p1",
                fields(json!({
                    "title": "Rust caching",
                    "content": "TTL entries expire lazily",
                    "authorId": "u1",
                    "authorName": "ada",
                    "createdAt": 100,
                    "likedBy": [],
                })),
            )
            .await
            .unwrap();
        store
            .insert(
                "posts/p2",
                fields(json!({
                    "title": "Gardening",
                    "content": "Tomatoes need sun",
                    "authorId": "u2",
                    "authorName": "bob",
                    "createdAt": 200,
                })),
            )
            .await
            .unwrap();
        let cache = PersistentCache::with_clock(MemoryStorage::new(), ManualClock::new(T0));
        App::new(store, cache)
    }

    fn ada() -> User {
        User::new("u1").with_display_name("ada")
    }

    fn ids(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_load_posts_is_cache_first() {
        let mut app = seeded_app().await;

        let posts = assert_ok!(app.load_posts("").await);
        assert_eq!(ids(posts), vec!["p2", "p1"]);
        assert_eq!(app.store().fetch_count(), 1);

        assert_ok!(app.load_posts("").await);
        assert_eq!(app.store().fetch_count(), 1);

        app.cache().clock().advance(ALL_POSTS_TTL_MS + 1);
        assert_ok!(app.load_posts("").await);
        assert_eq!(app.store().fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_search_is_fresh_and_filtered() {
        let mut app = seeded_app().await;

        let posts = assert_ok!(app.load_posts("  RUST ttl ").await);
        assert_eq!(ids(posts), vec!["p1"]);
        let posts = assert_ok!(app.load_posts("ada").await);
        assert_eq!(ids(posts), vec!["p1"]);

        assert_eq!(app.store().fetch_count(), 2);
        assert!(app.cache().peek("all_posts").is_none());
    }

    #[tokio::test]
    async fn test_failed_load_leaves_cache_and_listing() {
        let mut app = seeded_app().await;
        assert_ok!(app.load_posts("").await);
        app.cache_mut().clear("all_posts");

        app.store()
            .set_failure(Some(StoreError::Network("offline".into())))
            .await;
        let err = assert_err!(app.load_posts("").await);

        assert!(matches!(err, AppError::Store(StoreError::Network(_))));
        assert!(app.cache().is_empty());
        assert_eq!(app.state().posts().len(), 2);
    }

    #[tokio::test]
    async fn test_open_post_detail_counts_view() {
        let mut app = seeded_app().await;
        assert_ok!(app.load_posts("").await);
        assert_ok!(app.load_post("p1").await);
        assert!(app.cache().peek("post_p1").is_some());

        let post = assert_ok!(app.open_post_detail("p1").await);
        assert_eq!(post.views, 1);
        assert_eq!(app.state().find_post("p1").map(|p| p.views), Some(1));
        assert!(app.cache().peek("post_p1").is_none());

        let doc = app.store().get_document("posts/p1").await.unwrap().unwrap();
        assert_eq!(doc.fields["views"], json!(1));

        // Every open counts
        assert_ok!(app.open_post_detail("p1").await);
        assert_eq!(app.state().current_post().map(|p| p.views), Some(2));
    }

    #[tokio::test]
    async fn test_open_post_detail_survives_counter_failure() {
        let mut app = seeded_app().await;
        assert_ok!(app.load_posts("").await);
        app.store()
            .set_failure(Some(StoreError::PermissionDenied("views".into())))
            .await;

        let post = assert_ok!(app.open_post_detail("p2").await);
        assert_eq!(post.id, "p2");
        assert_eq!(post.views, 1);
    }

    #[tokio::test]
    async fn test_open_unknown_post() {
        let mut app = seeded_app().await;
        assert_ok!(app.load_posts("").await);

        let err = assert_err!(app.open_post_detail("nope").await);
        assert!(matches!(err, AppError::PostNotFound(_)));
        assert_eq!(err.user_message(), "Post not found.");
    }

    #[tokio::test]
    async fn test_guards() {
        let mut app = seeded_app().await;

        let err = assert_err!(app.add_comment("p1", "hi").await);
        assert_eq!(err.user_message(), "Please login to comment.");
        let err = assert_err!(app.toggle_like("p1").await);
        assert_eq!(err.user_message(), "Please login to like posts.");

        assert_ok!(app.on_auth_state_changed(Some(ada())).await);
        let err = assert_err!(app.add_comment("p1", "   ").await);
        assert_eq!(err.user_message(), "Please enter a comment.");
        let err = assert_err!(app.add_reply("p1", "c1", "").await);
        assert_eq!(err.user_message(), "Please enter a reply.");
        let err = assert_err!(app.edit_reply("p1", "c1", "r1", "\n").await);
        assert_eq!(err.user_message(), "Reply cannot be empty.");
        let err = assert_err!(app.edit_comment("p1", "c1", "").await);
        assert_eq!(err.user_message(), "Comment cannot be empty.");
    }

    #[tokio::test]
    async fn test_create_post_invalidates_listings() {
        let mut app = seeded_app().await;
        assert_ok!(app.on_auth_state_changed(Some(ada())).await);
        assert_ok!(app.load_user_posts("u1").await);
        assert_ok!(app.load_author_posts("ada").await);
        assert_ok!(app.load_author_posts("bob").await);
        assert_eq!(app.cache().len(), 4);

        let id = assert_ok!(app.create_post(" New post ", "Body").await);

        assert_eq!(app.cache().keys(), vec!["posts_by_author_bob"]);
        let posts = assert_ok!(app.load_posts("").await);
        assert_eq!(posts.len(), 3);

        let created = assert_ok!(app.load_post(&id).await);
        assert_eq!(created.title, "New post");
        assert_eq!(created.author_name, "ada");
        assert_eq!(created.created_at, Some(T0 as i64));
    }

    #[tokio::test]
    async fn test_edit_post_uses_document_author() {
        let mut app = seeded_app().await;
        assert_ok!(app.on_auth_state_changed(Some(User::new("u9"))).await);
        assert_ok!(app.load_author_posts("bob").await);
        assert_ok!(app.load_post("p2").await);

        assert_ok!(app.edit_post("p2", "Gardening 2", "More tomatoes").await);

        assert!(app.cache().is_empty());
        assert_eq!(
            app.state().find_post("p2").map(|p| p.title.as_str()),
            Some("Gardening 2")
        );
    }

    #[tokio::test]
    async fn test_delete_post() {
        let mut app = seeded_app().await;
        assert_ok!(app.on_auth_state_changed(Some(ada())).await);
        assert_ok!(app.open_post_detail("p1").await);

        assert_ok!(app.delete_post("p1").await);

        assert!(app.state().find_post("p1").is_none());
        assert!(app.state().current_post().is_none());
        assert!(app.cache().peek("all_posts").is_none());
        let err = assert_err!(app.load_post("p1").await);
        assert!(matches!(err, AppError::PostNotFound(_)));
    }

    #[tokio::test]
    async fn test_toggle_like_round_trip() {
        let mut app = seeded_app().await;
        assert_ok!(app.on_auth_state_changed(Some(ada())).await);
        assert_ok!(app.open_post_detail("p1").await);

        assert!(assert_ok!(app.toggle_like("p1").await));
        let post = app.state().current_post().unwrap();
        assert_eq!(post.likes, 1);
        assert!(post.is_liked_by("u1"));

        assert!(!assert_ok!(app.toggle_like("p1").await));
        let post = app.state().current_post().unwrap();
        assert_eq!(post.likes, 0);
        assert!(post.liked_by.is_empty());

        let doc = app.store().get_document("posts/p1").await.unwrap().unwrap();
        assert_eq!(doc.fields["likes"], json!(0));
        assert_eq!(doc.fields["likedBy"], json!([]));
    }

    #[tokio::test]
    async fn test_failed_mutation_still_invalidates() {
        let mut app = seeded_app().await;
        assert_ok!(app.on_auth_state_changed(Some(ada())).await);
        assert_ok!(app.load_post("p1").await);

        app.store()
            .set_failure(Some(StoreError::Network("offline".into())))
            .await;
        let err = assert_err!(app.toggle_like("p1").await);

        assert_eq!(err.user_message(), "Request failed. Please try again.");
        assert!(app.cache().peek("post_p1").is_none());
        assert!(app.cache().peek("all_posts").is_some());
    }

    /// Store whose standalone counter updates always fail.
    struct CountersDown(MemoryDocumentStore);

    #[async_trait]
    impl DocumentStore for CountersDown {
        async fn fetch_ordered(&self, query: &Query) -> StoreResult<Vec<Document>> {
            self.0.fetch_ordered(query).await
        }

        async fn get_document(&self, path: &str) -> StoreResult<Option<Document>> {
            self.0.get_document(path).await
        }

        async fn apply_patch(&self, path: &str, patch: Patch) -> StoreResult<()> {
            self.0.apply_patch(path, patch).await
        }

        async fn increment_field(&self, path: &str, _field: &str, _delta: i64) -> StoreResult<()> {
            Err(StoreError::Network(path.to_string()))
        }

        async fn add_document(&self, collection: &str, fields: Fields) -> StoreResult<String> {
            self.0.add_document(collection, fields).await
        }

        async fn delete_document(&self, path: &str) -> StoreResult<()> {
            self.0.delete_document(path).await
        }
    }

    #[tokio::test]
    async fn test_like_writes_list_and_counter_together() {
        let seeded = seeded_app().await;
        let cache = PersistentCache::with_clock(MemoryStorage::new(), ManualClock::new(T0));
        let mut app = App::new(CountersDown(seeded.store), cache);
        assert_ok!(app.on_auth_state_changed(Some(ada())).await);

        assert!(assert_ok!(app.toggle_like("p1").await));

        let doc = app.store().0.get_document("posts/p1").await.unwrap().unwrap();
        assert_eq!(doc.fields["likedBy"], json!(["u1"]));
        assert_eq!(doc.fields["likes"], json!(1));
    }

    #[tokio::test]
    async fn test_comment_counter() {
        let mut app = seeded_app().await;
        assert_ok!(app.on_auth_state_changed(Some(ada())).await);
        assert_ok!(app.open_post_detail("p1").await);

        assert_ok!(app.add_comment("p1", "first").await);
        app.cache().clock().advance(1_000);
        assert_ok!(app.add_comment("p1", "second").await);
        assert_eq!(app.state().current_post().map(|p| p.comment_count), Some(2));

        let comments = assert_ok!(app.load_comments("p1").await);
        let texts: Vec<&str> = comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(texts, vec!["second", "first"]);

        assert_ok!(app.edit_comment("p1", &comments[0].id, "edited").await);
        assert_ok!(app.delete_comment("p1", &comments[1].id).await);
        assert_eq!(app.state().current_post().map(|p| p.comment_count), Some(1));

        let comments = assert_ok!(app.load_comments("p1").await);
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].content, "edited");
    }

    #[tokio::test]
    async fn test_replies() {
        let mut app = seeded_app().await;
        assert_ok!(app.on_auth_state_changed(Some(ada())).await);
        assert_ok!(app.add_comment("p1", "question").await);
        let comments = assert_ok!(app.load_comments("p1").await);
        let comment_id = comments[0].id.clone();

        assert_ok!(app.add_reply("p1", &comment_id, "one").await);
        app.cache().clock().advance(10);
        assert_ok!(app.add_reply("p1", &comment_id, "two").await);

        let replies = assert_ok!(app.load_replies("p1", &comment_id).await);
        let texts: Vec<&str> = replies.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(texts, vec!["one", "two"]);
        assert_eq!(replies[0].parent_comment_id, comment_id);

        assert_ok!(app.delete_reply("p1", &comment_id, &replies[0].id).await);
        let comments = assert_ok!(app.load_comments("p1").await);
        assert_eq!(comments[0].reply_count, 1);
    }

    #[tokio::test]
    async fn test_messaging() {
        let mut app = seeded_app().await;

        assert_ok!(app.send_message("u2", "hello").await);
        assert!(assert_ok!(app.fetch_messages_with("u2").await).is_empty());

        assert_ok!(app.on_auth_state_changed(Some(ada())).await);
        assert_ok!(app.send_message("u2", "   ").await);
        assert_ok!(app.send_message("u2", "hello").await);
        app.cache().clock().advance(5);
        assert_ok!(app.send_message("u3", "elsewhere").await);

        let messages = assert_ok!(app.fetch_messages_with("u2").await);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, "u1");
        assert_eq!(messages[0].content, "hello");
    }

    #[tokio::test]
    async fn test_empty_ids_read_nothing() {
        let mut app = seeded_app().await;
        assert!(assert_ok!(app.load_user_posts("").await).is_empty());
        assert!(assert_ok!(app.load_author_posts("").await).is_empty());
        assert_eq!(app.store().fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_post_cards_follow_viewer() {
        let mut app = seeded_app().await;
        assert_ok!(app.on_auth_state_changed(Some(ada())).await);
        assert_ok!(app.open_post_detail("p1").await);
        assert_ok!(app.toggle_like("p1").await);
        app.cache_mut().clear("all_posts");
        assert_ok!(app.load_posts("").await);

        let cards = app.post_cards();
        assert_eq!(cards.len(), 2);
        let liked: Vec<bool> = cards.iter().map(|c| c.liked).collect();
        assert_eq!(liked, vec![false, true]);
        assert_eq!(cards[1].author_initials, "A");
    }
}
