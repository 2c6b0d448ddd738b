//! Collection and document paths used by the client.

pub const POSTS: &str = "posts";
pub const MESSAGES: &str = "messages";

pub fn post(post_id: &str) -> String {
    format!("{}/{}", POSTS, post_id)
}

pub fn comments(post_id: &str) -> String {
    format!("{}/comments", post(post_id))
}

pub fn comment(post_id: &str, comment_id: &str) -> String {
    format!("{}/{}", comments(post_id), comment_id)
}

pub fn replies(post_id: &str, comment_id: &str) -> String {
    format!("{}/replies", comment(post_id, comment_id))
}

pub fn reply(post_id: &str, comment_id: &str, reply_id: &str) -> String {
    format!("{}/{}", replies(post_id, comment_id), reply_id)
}
