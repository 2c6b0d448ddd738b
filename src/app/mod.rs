//! Application Module
//!
//! The blogging client on top of the cache: state, read and mutation paths,
//! action dispatch and listing view models.

mod actions;
mod service;
mod state;
mod views;

pub use actions::Action;
pub use service::App;
pub use state::AppState;
pub use views::{author_initials, relative_date, truncate_text, PostCard, PREVIEW_CHARS};
