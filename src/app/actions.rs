//! Action dispatch
//!
//! UI events arrive as a name plus positional arguments. [`Action::parse`]
//! turns them into a typed [`Action`] and [`App::dispatch`] routes it.

use tracing::debug;

use crate::app::App;
use crate::cache::Clock;
use crate::error::{AppError, Result};
use crate::remote::DocumentStore;
use crate::storage::Storage;

// == Action ==
/// A user-triggered operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Search { query: String },
    OpenPost { post_id: String },
    ToggleLike { post_id: String },
    AddComment { post_id: String, content: String },
    EditComment { post_id: String, comment_id: String, content: String },
    DeleteComment { post_id: String, comment_id: String },
    AddReply { post_id: String, comment_id: String, content: String },
    EditReply {
        post_id: String,
        comment_id: String,
        reply_id: String,
        content: String,
    },
    DeleteReply {
        post_id: String,
        comment_id: String,
        reply_id: String,
    },
    SendMessage { receiver_id: String, content: String },
}

impl Action {
    // == Parse ==
    /// Builds an action from its name and arguments.
    ///
    /// `search` joins all of its arguments into one query; every other action
    /// takes exactly its listed arguments.
    pub fn parse(name: &str, args: &[&str]) -> Result<Self> {
        let owned = |i: usize| args[i].to_string();
        let action = match (name, args.len()) {
            ("search", _) => Action::Search {
                query: args.join(" "),
            },
            ("openPost", 1) => Action::OpenPost { post_id: owned(0) },
            ("toggleLike", 1) => Action::ToggleLike { post_id: owned(0) },
            ("addComment", 2) => Action::AddComment {
                post_id: owned(0),
                content: owned(1),
            },
            ("editComment", 3) => Action::EditComment {
                post_id: owned(0),
                comment_id: owned(1),
                content: owned(2),
            },
            ("deleteComment", 2) => Action::DeleteComment {
                post_id: owned(0),
                comment_id: owned(1),
            },
            ("addReply", 3) => Action::AddReply {
                post_id: owned(0),
                comment_id: owned(1),
                content: owned(2),
            },
            ("editReply", 4) => Action::EditReply {
                post_id: owned(0),
                comment_id: owned(1),
                reply_id: owned(2),
                content: owned(3),
            },
            ("deleteReply", 3) => Action::DeleteReply {
                post_id: owned(0),
                comment_id: owned(1),
                reply_id: owned(2),
            },
            ("sendMessage", 2) => Action::SendMessage {
                receiver_id: owned(0),
                content: owned(1),
            },
            (name, count) if Self::is_known(name) => {
                return Err(AppError::InvalidAction(format!(
                    "{} does not take {} argument(s)",
                    name, count
                )))
            }
            (name, _) => return Err(AppError::UnknownAction(name.to_string())),
        };
        Ok(action)
    }

    /// Dispatch name of this action.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Search { .. } => "search",
            Action::OpenPost { .. } => "openPost",
            Action::ToggleLike { .. } => "toggleLike",
            Action::AddComment { .. } => "addComment",
            Action::EditComment { .. } => "editComment",
            Action::DeleteComment { .. } => "deleteComment",
            Action::AddReply { .. } => "addReply",
            Action::EditReply { .. } => "editReply",
            Action::DeleteReply { .. } => "deleteReply",
            Action::SendMessage { .. } => "sendMessage",
        }
    }

    fn is_known(name: &str) -> bool {
        matches!(
            name,
            "openPost"
                | "toggleLike"
                | "addComment"
                | "editComment"
                | "deleteComment"
                | "addReply"
                | "editReply"
                | "deleteReply"
                | "sendMessage"
        )
    }
}

impl<D: DocumentStore, S: Storage, C: Clock> App<D, S, C> {
    // == Dispatch ==
    /// Runs `action` against the app.
    pub async fn dispatch(&mut self, action: Action) -> Result<()> {
        debug!("Dispatching {}", action.name());
        match action {
            Action::Search { query } => {
                self.load_posts(&query).await?;
            }
            Action::OpenPost { post_id } => {
                self.open_post_detail(&post_id).await?;
            }
            Action::ToggleLike { post_id } => {
                self.toggle_like(&post_id).await?;
            }
            Action::AddComment { post_id, content } => {
                self.add_comment(&post_id, &content).await?;
            }
            Action::EditComment {
                post_id,
                comment_id,
                content,
            } => {
                self.edit_comment(&post_id, &comment_id, &content).await?;
            }
            Action::DeleteComment {
                post_id,
                comment_id,
            } => {
                self.delete_comment(&post_id, &comment_id).await?;
            }
            Action::AddReply {
                post_id,
                comment_id,
                content,
            } => {
                self.add_reply(&post_id, &comment_id, &content).await?;
            }
            Action::EditReply {
                post_id,
                comment_id,
                reply_id,
                content,
            } => {
                self.edit_reply(&post_id, &comment_id, &reply_id, &content)
                    .await?;
            }
            Action::DeleteReply {
                post_id,
                comment_id,
                reply_id,
            } => {
                self.delete_reply(&post_id, &comment_id, &reply_id).await?;
            }
            Action::SendMessage {
                receiver_id,
                content,
            } => {
                self.send_message(&receiver_id, &content).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_joins_args() {
        assert_eq!(
            Action::parse("search", &["rust", "cache"]).unwrap(),
            Action::Search {
                query: "rust cache".to_string()
            }
        );
        assert_eq!(
            Action::parse("search", &[]).unwrap(),
            Action::Search {
                query: String::new()
            }
        );
    }

    #[test]
    fn test_parse_reply_actions() {
        let action = Action::parse("editReply", &["p1", "c1", "r1", "fixed"]).unwrap();
        assert_eq!(
            action,
            Action::EditReply {
                post_id: "p1".into(),
                comment_id: "c1".into(),
                reply_id: "r1".into(),
                content: "fixed".into(),
            }
        );
        assert_eq!(action.name(), "editReply");
    }

    #[test]
    fn test_parse_unknown_name() {
        let err = Action::parse("sharePost", &["p1"]).unwrap_err();
        assert!(matches!(err, AppError::UnknownAction(ref name) if name == "sharePost"));
    }

    #[test]
    fn test_parse_wrong_arity() {
        for (name, args) in [
            ("openPost", vec![]),
            ("toggleLike", vec!["p1", "p2"]),
            ("addComment", vec!["p1"]),
            ("deleteReply", vec!["p1", "c1"]),
        ] {
            let err = Action::parse(name, &args).unwrap_err();
            assert!(matches!(err, AppError::InvalidAction(_)), "{}", name);
        }
    }

    #[test]
    fn test_name_matches_parse() {
        let action = Action::parse("sendMessage", &["u2", "hi"]).unwrap();
        assert_eq!(Action::parse(action.name(), &["u2", "hi"]).unwrap(), action);
    }
}
