//! The driver's own record of what it asked the engine to do.
//!
//! The gateway reads these mirrors, never the engine. They are populated
//! only by the driver and can lag or differ from engine state (a mirrored
//! post carries no karma, for example).

use std::collections::BTreeMap;

use agora_types::{CommentId, PostId};
use serde::Serialize;

/// Number of entries returned by [`Mirror::feed`].
pub const FEED_LEN: usize = 5;

/// A post as the driver recorded it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirroredPost {
    /// Engine-generated post ID.
    pub id: PostId,
    /// Post title.
    pub title: String,
    /// Post body.
    pub content: String,
    /// Author.
    pub username: String,
    /// Community it was posted in.
    pub subreddit: String,
}

/// A comment as the driver recorded it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirroredComment {
    /// Engine-generated comment ID.
    pub id: CommentId,
    /// Comment body.
    pub content: String,
    /// Author.
    pub username: String,
    /// Direction of the attached vote.
    pub upvote: bool,
}

/// A direct message as the driver recorded it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirroredMessage {
    /// Sender.
    pub from: String,
    /// Message body.
    pub content: String,
    /// Send time, unix milliseconds.
    pub timestamp: i64,
}

/// Summary counts for the status endpoint.
///
/// `total_posts` and `total_comments` count buckets (communities with posts,
/// posts with comments), not individual entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SimulationStatus {
    /// Clients spawned by the driver.
    pub active_users: usize,
    /// Configured communities.
    pub subreddits: usize,
    /// Communities holding at least one mirrored post.
    pub total_posts: usize,
    /// Posts holding at least one mirrored comment.
    pub total_comments: usize,
}

/// Read-only reporting mirrors.
#[derive(Debug, Clone, Default)]
pub struct Mirror {
    subreddits: Vec<String>,
    active_users: usize,
    posts: BTreeMap<String, Vec<MirroredPost>>,
    comments: BTreeMap<PostId, Vec<MirroredComment>>,
    direct_messages: BTreeMap<String, Vec<MirroredMessage>>,
}

impl Mirror {
    /// Empty mirrors listing the configured communities.
    pub const fn new(subreddits: Vec<String>) -> Self {
        Self {
            subreddits,
            active_users: 0,
            posts: BTreeMap::new(),
            comments: BTreeMap::new(),
            direct_messages: BTreeMap::new(),
        }
    }

    /// Record how many clients are running.
    pub const fn set_active_users(&mut self, count: usize) {
        self.active_users = count;
    }

    /// Record a created post under its community.
    pub fn record_post(&mut self, post: MirroredPost) {
        self.posts
            .entry(post.subreddit.clone())
            .or_default()
            .push(post);
    }

    /// Record a comment under its post.
    pub fn record_comment(&mut self, post_id: PostId, comment: MirroredComment) {
        self.comments.entry(post_id).or_default().push(comment);
    }

    /// Record a direct message under its recipient.
    pub fn record_direct_message(&mut self, to: &str, message: MirroredMessage) {
        self.direct_messages
            .entry(to.to_owned())
            .or_default()
            .push(message);
    }

    /// Posts previously recorded in `subreddit`.
    pub fn posts_in(&self, subreddit: &str) -> &[MirroredPost] {
        self.posts.get(subreddit).map_or(&[], Vec::as_slice)
    }

    /// Summary counts.
    pub fn status(&self) -> SimulationStatus {
        SimulationStatus {
            active_users: self.active_users,
            subreddits: self.subreddits.len(),
            total_posts: self.posts.len(),
            total_comments: self.comments.len(),
        }
    }

    /// Configured communities, in configured order.
    pub fn subreddits(&self) -> &[String] {
        &self.subreddits
    }

    /// Every mirrored post across all communities.
    pub fn posts(&self) -> Vec<MirroredPost> {
        self.posts.values().flatten().cloned().collect()
    }

    /// Comments mirrored for a post; empty if none.
    pub fn comments(&self, post_id: PostId) -> Vec<MirroredComment> {
        self.comments.get(&post_id).cloned().unwrap_or_default()
    }

    /// The first [`FEED_LEN`] mirrored posts.
    ///
    /// The username does not filter the result.
    pub fn feed(&self, _username: &str) -> Vec<MirroredPost> {
        self.posts.values().flatten().take(FEED_LEN).cloned().collect()
    }

    /// Direct messages mirrored for a recipient; empty if none.
    pub fn direct_messages(&self, username: &str) -> Vec<MirroredMessage> {
        self.direct_messages
            .get(username)
            .cloned()
            .unwrap_or_default()
    }
}
