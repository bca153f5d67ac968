//! Core entity records shared by the engine, the driver, and the gateway.
//!
//! These are plain data. Invariants (a post references an existing
//! community, a comment references an existing post) are enforced by the
//! engine at creation time and never re-checked here.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{CommentId, PostId};

/// A post inside a community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Post {
    /// Engine-generated identifier.
    #[ts(type = "string")]
    pub id: PostId,
    /// Name of the community the post was created in.
    pub subreddit: String,
    /// Username of the author.
    pub author: String,
    /// Post title.
    pub title: String,
    /// Post body.
    pub content: String,
    /// Net vote count. Starts at zero and may go negative.
    #[ts(type = "number")]
    pub karma: i64,
}

/// A comment attached to a post.
///
/// Every comment carries a vote direction that was applied to the post's
/// karma when the comment was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Comment {
    /// Engine-generated identifier.
    #[ts(type = "string")]
    pub id: CommentId,
    /// The post this comment belongs to.
    #[ts(type = "string")]
    pub post_id: PostId,
    /// Comment being replied to. Stored only; no tree is built from it.
    #[ts(type = "string | null")]
    pub parent_id: Option<CommentId>,
    /// Username of the author.
    pub author: String,
    /// Comment body.
    pub content: String,
    /// Whether the attached vote was an upvote.
    pub is_upvote: bool,
}

/// A direct message between two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DirectMessage {
    /// Identity of the sender.
    pub from: String,
    /// Username of the recipient.
    pub to: String,
    /// Message body.
    pub content: String,
    /// Caller-supplied send time, unix milliseconds.
    #[ts(type = "number")]
    pub timestamp: i64,
}
