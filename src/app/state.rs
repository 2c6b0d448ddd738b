//! Application state owned by [`App`](crate::app::App).
//!
//! Rendering code reads through the accessors; only the loading and mutation
//! paths inside the crate change it.

use crate::models::{Post, User};

/// Signed-in user, loaded listing and the post open in detail view.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    current_user: Option<User>,
    posts: Vec<Post>,
    current_post: Option<Post>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current_user.is_some()
    }

    /// Listing from the last successful load, in display order.
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn find_post(&self, post_id: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == post_id)
    }

    pub fn current_post(&self) -> Option<&Post> {
        self.current_post.as_ref()
    }

    pub(crate) fn set_current_user(&mut self, user: Option<User>) {
        self.current_user = user;
    }

    pub(crate) fn set_posts(&mut self, posts: Vec<Post>) {
        self.posts = posts;
    }

    pub(crate) fn find_post_mut(&mut self, post_id: &str) -> Option<&mut Post> {
        self.posts.iter_mut().find(|p| p.id == post_id)
    }

    pub(crate) fn remove_post(&mut self, post_id: &str) {
        self.posts.retain(|p| p.id != post_id);
        if self.current_post.as_ref().is_some_and(|p| p.id == post_id) {
            self.current_post = None;
        }
    }

    pub(crate) fn set_current_post(&mut self, post: Option<Post>) {
        self.current_post = post;
    }

    /// The open post, only if it is `post_id`.
    pub(crate) fn current_post_mut(&mut self, post_id: &str) -> Option<&mut Post> {
        self.current_post.as_mut().filter(|p| p.id == post_id)
    }
}
