//! View models for the post listing.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::Post;

/// Characters of content shown on a card before it is cut.
pub const PREVIEW_CHARS: usize = 200;

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
const MONTH_MS: i64 = 30 * DAY_MS;

// == Post Card ==
/// What a listing row displays for one post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostCard {
    pub id: String,
    pub title: String,
    pub author_name: String,
    pub author_initials: String,
    pub date_label: String,
    pub preview: String,
    pub views: i64,
    pub likes: i64,
    pub comment_count: i64,
    pub liked: bool,
}

impl PostCard {
    /// Builds the card for `post` as seen by `viewer` at `now_ms`.
    pub fn new(post: &Post, viewer: Option<&str>, now_ms: i64) -> Self {
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            author_name: post.author_name.clone(),
            author_initials: author_initials(&post.author_name),
            date_label: relative_date(post.created_at, now_ms),
            preview: truncate_text(&post.content, PREVIEW_CHARS),
            views: post.views,
            likes: post.likes,
            comment_count: post.comment_count,
            liked: viewer.is_some_and(|uid| post.is_liked_by(uid)),
        }
    }
}

/// First letters of up to two words, uppercased. `?` for an empty name.
pub fn author_initials(name: &str) -> String {
    let initials: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect();
    if initials.is_empty() {
        "?".to_string()
    } else {
        initials
    }
}

/// Age of `created_at` relative to `now_ms`, calendar date once a month old.
pub fn relative_date(created_at: Option<i64>, now_ms: i64) -> String {
    let Some(created_at) = created_at.filter(|ts| *ts > 0) else {
        return "Unknown".to_string();
    };

    let age = now_ms.saturating_sub(created_at).max(0);
    if age < MINUTE_MS {
        "Just now".to_string()
    } else if age < HOUR_MS {
        format!("{}m ago", age / MINUTE_MS)
    } else if age < DAY_MS {
        format!("{}h ago", age / HOUR_MS)
    } else if age < MONTH_MS {
        format!("{}d ago", age / DAY_MS)
    } else {
        DateTime::<Utc>::from_timestamp_millis(created_at)
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// Cuts `text` to `max_chars` characters and appends `...` when it was longer.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
