//! Domain models for the blogging client
//!
//! Records as they are decoded from the remote store and cached. Field names
//! follow the store's camelCase document fields.

pub mod message;
pub mod post;
pub mod user;

// Re-export commonly used types
pub use message::Message;
pub use post::{keywords, Comment, Post, Reply};
pub use user::User;
