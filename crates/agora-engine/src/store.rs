//! The engine's domain state and the operations over it.
//!
//! [`EngineState`] owns all five collections: users, communities, posts,
//! comments, and direct messages. Nothing outside this module touches them.
//! Each operation validates against current state and either applies its
//! mutation or returns a [`Rejection`] without changing anything.
//!
//! Locking is not handled here. The mailbox wraps the state in a single
//! reader/writer lock and calls the `&mut self` methods under the write
//! guard and the `&self` methods under a read guard.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use agora_types::{Comment, CommentId, DirectMessage, Post, PostId};
use serde::Serialize;
use tracing::debug;

use crate::error::Rejection;
use crate::ids::IdProvider;
use crate::karma::{self, VoteDirection, VoteReceipt};
use crate::protocol::{DeliveryHandle, WeakDeliveryHandle};

/// A community and its members.
#[derive(Debug, Clone, Default)]
struct Subreddit {
    description: String,
    members: BTreeSet<String>,
}

/// Counts over the engine's collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Registered usernames.
    pub users: usize,
    /// Registered users whose inbox is still open.
    pub online_users: usize,
    /// Communities.
    pub subreddits: usize,
    /// Posts.
    pub posts: usize,
    /// Comments across all posts.
    pub comments: usize,
    /// Direct messages across all recipients.
    pub direct_messages: usize,
}

/// All mutable domain state.
#[derive(Debug)]
pub struct EngineState {
    users: BTreeMap<String, WeakDeliveryHandle>,
    subreddits: BTreeMap<String, Subreddit>,
    /// Posts in creation order.
    posts: Vec<Post>,
    post_index: BTreeMap<PostId, usize>,
    comments: BTreeMap<PostId, Vec<Comment>>,
    direct_messages: BTreeMap<String, Vec<DirectMessage>>,
    ids: Arc<dyn IdProvider>,
}

impl EngineState {
    /// Create empty state drawing identifiers from `ids`.
    pub fn new(ids: Arc<dyn IdProvider>) -> Self {
        Self {
            users: BTreeMap::new(),
            subreddits: BTreeMap::new(),
            posts: Vec::new(),
            post_index: BTreeMap::new(),
            comments: BTreeMap::new(),
            direct_messages: BTreeMap::new(),
            ids,
        }
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Claim `username` and remember where to reach its owner.
    ///
    /// # Errors
    ///
    /// [`Rejection::UsernameTaken`] if the name is already registered.
    pub fn register(&mut self, username: &str, handle: &DeliveryHandle) -> Result<(), Rejection> {
        if self.users.contains_key(username) {
            return Err(Rejection::UsernameTaken {
                username: username.to_owned(),
            });
        }
        self.users.insert(username.to_owned(), handle.downgrade());
        Ok(())
    }

    /// The stored delivery handle for `username`, if its inbox is still open.
    pub fn delivery_handle(&self, username: &str) -> Option<DeliveryHandle> {
        self.users.get(username).and_then(WeakDeliveryHandle::upgrade)
    }

    // -----------------------------------------------------------------------
    // Communities
    // -----------------------------------------------------------------------

    /// Create an empty community.
    ///
    /// # Errors
    ///
    /// [`Rejection::SubredditExists`] if the name is taken.
    pub fn create_subreddit(&mut self, name: &str, description: &str) -> Result<(), Rejection> {
        if self.subreddits.contains_key(name) {
            return Err(Rejection::SubredditExists {
                name: name.to_owned(),
            });
        }
        self.subreddits.insert(
            name.to_owned(),
            Subreddit {
                description: description.to_owned(),
                members: BTreeSet::new(),
            },
        );
        Ok(())
    }

    /// Add `username` to a community. Joining twice is not an error.
    ///
    /// # Errors
    ///
    /// [`Rejection::SubredditNotFound`] if the community does not exist.
    pub fn join_subreddit(&mut self, subreddit: &str, username: &str) -> Result<(), Rejection> {
        let community = self.subreddit_mut(subreddit)?;
        community.members.insert(username.to_owned());
        Ok(())
    }

    /// Remove `username` from a community. Leaving as a non-member is not
    /// an error.
    ///
    /// # Errors
    ///
    /// [`Rejection::SubredditNotFound`] if the community does not exist.
    pub fn leave_subreddit(&mut self, subreddit: &str, username: &str) -> Result<(), Rejection> {
        let community = self.subreddit_mut(subreddit)?;
        community.members.remove(username);
        Ok(())
    }

    /// Whether `username` is a member of `subreddit`.
    pub fn is_member(&self, subreddit: &str, username: &str) -> bool {
        self.subreddits
            .get(subreddit)
            .is_some_and(|s| s.members.contains(username))
    }

    /// Description a community was created with.
    pub fn subreddit_description(&self, subreddit: &str) -> Option<&str> {
        self.subreddits.get(subreddit).map(|s| s.description.as_str())
    }

    fn subreddit_mut(&mut self, name: &str) -> Result<&mut Subreddit, Rejection> {
        self.subreddits
            .get_mut(name)
            .ok_or_else(|| Rejection::SubredditNotFound {
                name: name.to_owned(),
            })
    }

    // -----------------------------------------------------------------------
    // Posts, comments, votes
    // -----------------------------------------------------------------------

    /// Store a new post with zero karma and return its ID.
    ///
    /// # Errors
    ///
    /// - [`Rejection::SubredditNotFound`] if the community does not exist.
    /// - [`Rejection::NotAMember`] if the author has not joined it.
    pub fn create_post(
        &mut self,
        subreddit: &str,
        username: &str,
        title: &str,
        content: &str,
    ) -> Result<PostId, Rejection> {
        let community =
            self.subreddits
                .get(subreddit)
                .ok_or_else(|| Rejection::SubredditNotFound {
                    name: subreddit.to_owned(),
                })?;
        if !community.members.contains(username) {
            return Err(Rejection::NotAMember {
                subreddit: subreddit.to_owned(),
                username: username.to_owned(),
            });
        }

        let id = PostId::from_raw(self.ids.next_id());
        self.post_index.insert(id, self.posts.len());
        self.posts.push(Post {
            id,
            subreddit: subreddit.to_owned(),
            author: username.to_owned(),
            title: title.to_owned(),
            content: content.to_owned(),
            karma: 0,
        });
        debug!(post_id = %id, subreddit, author = username, "Post stored");
        Ok(id)
    }

    /// Store a comment and apply its attached vote to the post.
    ///
    /// Returns the comment ID and the post's new karma.
    ///
    /// # Errors
    ///
    /// [`Rejection::PostNotFound`] if the post does not exist.
    pub fn create_comment(
        &mut self,
        post_id: PostId,
        parent_id: Option<CommentId>,
        username: &str,
        content: &str,
        upvote: bool,
    ) -> Result<(CommentId, i64), Rejection> {
        let post = self.post_mut(post_id)?;
        let direction = VoteDirection::from_upvote(upvote);
        post.karma = direction.apply(post.karma);
        let karma = post.karma;

        let id = CommentId::from_raw(self.ids.next_id());
        self.comments.entry(post_id).or_default().push(Comment {
            id,
            post_id,
            parent_id,
            author: username.to_owned(),
            content: content.to_owned(),
            is_upvote: upvote,
        });
        Ok((id, karma))
    }

    /// Apply a member's vote to a post.
    ///
    /// # Errors
    ///
    /// - [`Rejection::PostNotFound`] if the post does not exist.
    /// - [`Rejection::SubredditNotFound`] if its community does not exist.
    /// - [`Rejection::NotAMember`] if the voter has not joined it.
    pub fn vote(
        &mut self,
        post_id: PostId,
        username: &str,
        upvote: bool,
    ) -> Result<VoteReceipt, Rejection> {
        let index = *self
            .post_index
            .get(&post_id)
            .ok_or(Rejection::PostNotFound { post_id })?;
        let post = self
            .posts
            .get_mut(index)
            .ok_or(Rejection::PostNotFound { post_id })?;
        let community =
            self.subreddits
                .get(&post.subreddit)
                .ok_or_else(|| Rejection::SubredditNotFound {
                    name: post.subreddit.clone(),
                })?;
        karma::authorize_vote(&community.members, &post.subreddit, username)?;

        let direction = VoteDirection::from_upvote(upvote);
        post.karma = direction.apply(post.karma);
        Ok(VoteReceipt {
            post_id,
            username: username.to_owned(),
            direction,
            karma: post.karma,
        })
    }

    /// Current karma of a post.
    pub fn karma(&self, post_id: PostId) -> Option<i64> {
        self.post(post_id).map(|p| p.karma)
    }

    /// A stored post.
    pub fn post(&self, post_id: PostId) -> Option<&Post> {
        self.post_index
            .get(&post_id)
            .and_then(|&index| self.posts.get(index))
    }

    /// Comments on a post, in creation order.
    pub fn comments(&self, post_id: PostId) -> &[Comment] {
        self.comments.get(&post_id).map_or(&[], Vec::as_slice)
    }

    fn post_mut(&mut self, post_id: PostId) -> Result<&mut Post, Rejection> {
        let index = *self
            .post_index
            .get(&post_id)
            .ok_or(Rejection::PostNotFound { post_id })?;
        self.posts
            .get_mut(index)
            .ok_or(Rejection::PostNotFound { post_id })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Every post from a community `username` belongs to, highest karma
    /// first. Equal karma keeps creation order.
    pub fn feed(&self, username: &str) -> Vec<Post> {
        let mut feed: Vec<Post> = self
            .posts
            .iter()
            .filter(|post| self.is_member(&post.subreddit, username))
            .cloned()
            .collect();
        feed.sort_by_key(|post| core::cmp::Reverse(post.karma));
        feed
    }

    /// Direct messages received by `username`, in arrival order.
    pub fn direct_messages(&self, username: &str) -> Vec<DirectMessage> {
        self.direct_messages
            .get(username)
            .cloned()
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Direct messages
    // -----------------------------------------------------------------------

    /// Append a direct message to the recipient's list. Always succeeds.
    pub fn reply_direct_message(&mut self, from: &str, to: &str, content: &str, timestamp: i64) {
        self.direct_messages
            .entry(to.to_owned())
            .or_default()
            .push(DirectMessage {
                from: from.to_owned(),
                to: to.to_owned(),
                content: content.to_owned(),
                timestamp,
            });
    }

    /// Counts over all collections.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            users: self.users.len(),
            online_users: self
                .users
                .values()
                .filter(|h| h.upgrade().is_some())
                .count(),
            subreddits: self.subreddits.len(),
            posts: self.posts.len(),
            comments: self.comments.values().map(Vec::len).sum(),
            direct_messages: self.direct_messages.values().map(Vec::len).sum(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::ids::SequentialIdProvider;

    fn state() -> EngineState {
        EngineState::new(Arc::new(SequentialIdProvider::new(1)))
    }

    fn community_with(state: &mut EngineState, name: &str, members: &[&str]) {
        assert!(state.create_subreddit(name, "").is_ok());
        for member in members {
            assert!(state.join_subreddit(name, member).is_ok());
        }
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let mut state = state();
        let (handle, _inbox) = DeliveryHandle::channel("alice");
        assert!(state.register("alice", &handle).is_ok());
        let err = state.register("alice", &handle);
        assert_eq!(
            err.map_err(|r| r.kind()),
            Err(FailureKind::UniquenessViolation)
        );
        assert_eq!(state.stats().users, 1);
    }

    #[test]
    fn registered_handle_is_weak() {
        let mut state = state();
        let (handle, _inbox) = DeliveryHandle::channel("alice");
        assert!(state.register("alice", &handle).is_ok());
        assert!(state.delivery_handle("alice").is_some());
        assert_eq!(state.stats().online_users, 1);

        drop(handle);
        assert!(state.delivery_handle("alice").is_none());
        assert_eq!(state.stats().users, 1);
        assert_eq!(state.stats().online_users, 0);
    }

    #[test]
    fn duplicate_subreddit_is_rejected() {
        let mut state = state();
        assert!(state.create_subreddit("golang", "Go talk").is_ok());
        assert!(matches!(
            state.create_subreddit("golang", "again"),
            Err(Rejection::SubredditExists { .. })
        ));
        assert_eq!(state.subreddit_description("golang"), Some("Go talk"));
    }

    #[test]
    fn join_missing_subreddit_fails_and_rejoin_is_idempotent() {
        let mut state = state();
        assert!(matches!(
            state.join_subreddit("nope", "alice"),
            Err(Rejection::SubredditNotFound { .. })
        ));

        community_with(&mut state, "golang", &["alice"]);
        assert!(state.join_subreddit("golang", "alice").is_ok());
        assert!(state.is_member("golang", "alice"));
    }

    #[test]
    fn leaving_as_non_member_is_not_an_error() {
        let mut state = state();
        community_with(&mut state, "golang", &["alice"]);
        assert!(state.leave_subreddit("golang", "bob").is_ok());
        assert!(state.leave_subreddit("golang", "alice").is_ok());
        assert!(!state.is_member("golang", "alice"));
        assert!(matches!(
            state.leave_subreddit("rust", "alice"),
            Err(Rejection::SubredditNotFound { .. })
        ));
    }

    #[test]
    fn posting_requires_membership() {
        let mut state = state();
        community_with(&mut state, "golang", &[]);
        let err = state.create_post("golang", "alice", "Hi", "World");
        assert_eq!(err.map_err(|r| r.kind()), Err(FailureKind::AuthorizationGap));

        assert!(state.join_subreddit("golang", "alice").is_ok());
        let first = state.create_post("golang", "alice", "Hi", "World");
        let second = state.create_post("golang", "alice", "Hi", "World");
        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_ne!(first, second);
        let post = first.ok().and_then(|id| state.post(id).cloned());
        assert_eq!(post.map(|p| p.karma), Some(0));
    }

    #[test]
    fn posting_to_missing_subreddit_is_missing_referent() {
        let mut state = state();
        let err = state.create_post("nope", "alice", "t", "c");
        assert_eq!(err.map_err(|r| r.kind()), Err(FailureKind::MissingReferent));
    }

    #[test]
    fn comment_applies_vote_without_membership() {
        let mut state = state();
        community_with(&mut state, "golang", &["alice"]);
        let Ok(post_id) = state.create_post("golang", "alice", "Hi", "World") else {
            panic!("post creation failed");
        };

        let up = state.create_comment(post_id, None, "stranger", "nice", true);
        assert_eq!(up.map(|(_, karma)| karma), Ok(1));
        let down = state.create_comment(post_id, None, "stranger", "meh", false);
        assert_eq!(down.map(|(_, karma)| karma), Ok(0));

        let comments = state.comments(post_id);
        assert_eq!(comments.len(), 2);
        assert!(comments.first().is_some_and(|c| c.is_upvote));
    }

    #[test]
    fn comment_on_missing_post_fails() {
        let mut state = state();
        let err = state.create_comment(PostId::from_raw(5), None, "a", "b", true);
        assert!(matches!(err, Err(Rejection::PostNotFound { .. })));
    }

    #[test]
    fn vote_checks_post_and_membership() {
        let mut state = state();
        assert!(matches!(
            state.vote(PostId::from_raw(1), "alice", true),
            Err(Rejection::PostNotFound { .. })
        ));

        community_with(&mut state, "golang", &["alice"]);
        let Ok(post_id) = state.create_post("golang", "alice", "Hi", "World") else {
            panic!("post creation failed");
        };
        let refused = state.vote(post_id, "bob", true);
        assert_eq!(
            refused.map_err(|r| r.kind()),
            Err(FailureKind::AuthorizationGap)
        );
        assert_eq!(state.karma(post_id), Some(0));

        let receipt = state.vote(post_id, "alice", false);
        assert_eq!(receipt.map(|r| r.karma), Ok(-1));
        assert_eq!(state.karma(post_id), Some(-1));
    }

    #[test]
    fn feed_contains_only_member_posts_sorted_by_karma() {
        let mut state = state();
        community_with(&mut state, "golang", &["alice", "bob"]);
        community_with(&mut state, "rust", &["bob"]);

        let go_low = state.create_post("golang", "alice", "low", "");
        let go_high = state.create_post("golang", "bob", "high", "");
        let rust = state.create_post("rust", "bob", "crab", "");
        let (Ok(go_low), Ok(go_high), Ok(rust)) = (go_low, go_high, rust) else {
            panic!("post creation failed");
        };
        assert!(state.vote(go_high, "alice", true).is_ok());
        assert!(state.vote(go_high, "bob", true).is_ok());
        assert!(state.vote(rust, "bob", true).is_ok());

        let alice_feed: Vec<PostId> = state.feed("alice").iter().map(|p| p.id).collect();
        assert_eq!(alice_feed, vec![go_high, go_low]);

        let bob_feed = state.feed("bob");
        assert_eq!(bob_feed.len(), 3);
        assert!(bob_feed.windows(2).all(|w| match w {
            [a, b] => a.karma >= b.karma,
            _ => true,
        }));

        assert!(state.feed("carol").is_empty());
    }

    #[test]
    fn feed_ties_keep_creation_order() {
        let mut state = state();
        community_with(&mut state, "golang", &["alice"]);
        let ids: Vec<PostId> = (0..4)
            .filter_map(|i| state.create_post("golang", "alice", &format!("p{i}"), "").ok())
            .collect();
        let feed: Vec<PostId> = state.feed("alice").iter().map(|p| p.id).collect();
        assert_eq!(feed, ids);
    }

    #[test]
    fn direct_messages_keep_arrival_order() {
        let mut state = state();
        state.reply_direct_message("bob", "alice", "one", 1);
        state.reply_direct_message("carol", "alice", "two", 2);
        state.reply_direct_message("bob", "alice", "three", 3);

        let inbox: Vec<String> = state
            .direct_messages("alice")
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(inbox, vec!["one", "two", "three"]);
        assert!(state.direct_messages("nobody").is_empty());
        assert_eq!(state.stats().direct_messages, 3);
    }
}
