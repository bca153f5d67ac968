//! Request and response messages exchanged with the engine.
//!
//! Every request is addressed to the engine's single mailbox together with a
//! [`DeliveryHandle`] naming where the answer goes. The engine replies by
//! pushing one [`Response`] into that handle (two for a successful vote when
//! [`VoteAckPolicy::Double`](crate::karma::VoteAckPolicy::Double) is
//! configured).
//!
//! # Catalog
//!
//! | Request | Access | Response |
//! |---------|--------|----------|
//! | `Ready` | none | `Ready` |
//! | `Register` | exclusive | `Outcome` |
//! | `CreateSubreddit` | exclusive | `Outcome` |
//! | `JoinSubreddit` | exclusive | `Outcome` |
//! | `LeaveSubreddit` | exclusive | `Outcome` |
//! | `CreatePost` | exclusive | `Outcome` + `PostCreated` |
//! | `CreateComment` | exclusive | `Outcome` + `CommentCreated` |
//! | `Vote` | exclusive | `Outcome` + `Voted` |
//! | `GetKarma` | shared | `Karma` |
//! | `GetFeed` | shared | `Feed` |
//! | `GetDirectMessages` | shared | `DirectMessages` |
//! | `ReplyDirectMessage` | exclusive | `Outcome` |

use core::fmt;

use agora_types::{CommentId, DirectMessage, Post, PostId};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{FailureKind, Rejection};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A request to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Readiness probe. Answered as soon as the engine is accepting work.
    Ready,

    /// Claim a username and store the caller's delivery handle under it.
    Register {
        /// The username to claim.
        username: String,
    },

    /// Create an empty community.
    CreateSubreddit {
        /// Unique community name.
        name: String,
        /// Free-form description.
        #[serde(default)]
        description: String,
    },

    /// Add a user to a community's members.
    JoinSubreddit {
        /// Target community.
        subreddit: String,
        /// User joining.
        username: String,
    },

    /// Remove a user from a community's members.
    LeaveSubreddit {
        /// Target community.
        subreddit: String,
        /// User leaving.
        username: String,
    },

    /// Create a post in a community the author has joined.
    CreatePost {
        /// Target community.
        subreddit: String,
        /// Author.
        username: String,
        /// Post title.
        title: String,
        /// Post body.
        content: String,
    },

    /// Comment on a post. The attached vote is always applied to the post.
    CreateComment {
        /// The post being commented on.
        post_id: PostId,
        /// Optional comment being replied to.
        #[serde(default)]
        parent_id: Option<CommentId>,
        /// Author.
        username: String,
        /// Comment body.
        content: String,
        /// Direction of the attached vote.
        upvote: bool,
    },

    /// Vote on a post in a community the voter has joined.
    Vote {
        /// The post being voted on.
        post_id: PostId,
        /// The voter.
        username: String,
        /// `true` for an upvote, `false` for a downvote.
        upvote: bool,
    },

    /// Read a post's current karma.
    GetKarma {
        /// The post to read.
        post_id: PostId,
    },

    /// Posts from every community the user belongs to, highest karma first.
    GetFeed {
        /// The reader.
        username: String,
    },

    /// Direct messages received by a user, in arrival order.
    GetDirectMessages {
        /// The recipient.
        username: String,
    },

    /// Send a direct message. The sender is the requester's identity.
    ReplyDirectMessage {
        /// Recipient username.
        to: String,
        /// Message body.
        content: String,
        /// Caller-supplied send time, unix milliseconds.
        timestamp: i64,
    },
}

/// Lock mode a request needs on engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No state is read or written.
    None,
    /// Read-only; may run alongside other readers.
    Shared,
    /// Mutating; runs alone.
    Exclusive,
}

impl Request {
    /// The lock mode this request needs.
    pub const fn access(&self) -> Access {
        match self {
            Self::Ready => Access::None,
            Self::GetKarma { .. } | Self::GetFeed { .. } | Self::GetDirectMessages { .. } => {
                Access::Shared
            }
            Self::Register { .. }
            | Self::CreateSubreddit { .. }
            | Self::JoinSubreddit { .. }
            | Self::LeaveSubreddit { .. }
            | Self::CreatePost { .. }
            | Self::CreateComment { .. }
            | Self::Vote { .. }
            | Self::ReplyDirectMessage { .. } => Access::Exclusive,
        }
    }

    /// Short name of the request kind, for logs and errors.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Register { .. } => "register",
            Self::CreateSubreddit { .. } => "create_subreddit",
            Self::JoinSubreddit { .. } => "join_subreddit",
            Self::LeaveSubreddit { .. } => "leave_subreddit",
            Self::CreatePost { .. } => "create_post",
            Self::CreateComment { .. } => "create_comment",
            Self::Vote { .. } => "vote",
            Self::GetKarma { .. } => "get_karma",
            Self::GetFeed { .. } => "get_feed",
            Self::GetDirectMessages { .. } => "get_direct_messages",
            Self::ReplyDirectMessage { .. } => "reply_direct_message",
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Structured result carried by a successful mutating request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutcomePayload {
    /// A post was stored.
    PostCreated {
        /// The generated post ID.
        post_id: PostId,
    },
    /// A comment was stored and its vote applied.
    CommentCreated {
        /// The generated comment ID.
        comment_id: CommentId,
        /// The post's karma after the attached vote.
        karma: i64,
    },
    /// A vote was applied.
    Voted {
        /// The post voted on.
        post_id: PostId,
        /// The post's karma after the vote.
        karma: i64,
    },
}

/// Success flag plus human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Whether the request was applied.
    pub success: bool,
    /// Message for the caller.
    pub message: String,
    /// Failure class, present when `success` is false.
    pub failure: Option<FailureKind>,
    /// Structured result, present for some successful requests.
    pub payload: Option<OutcomePayload>,
}

impl Outcome {
    /// A successful outcome with no payload.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            failure: None,
            payload: None,
        }
    }

    /// Attach a structured payload.
    #[must_use]
    pub const fn with_payload(mut self, payload: OutcomePayload) -> Self {
        self.payload = Some(payload);
        self
    }
}

impl From<Rejection> for Outcome {
    fn from(rejection: Rejection) -> Self {
        Self {
            success: false,
            message: rejection.to_string(),
            failure: Some(rejection.kind()),
            payload: None,
        }
    }
}

/// A message sent back by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Readiness acknowledgment.
    Ready,
    /// Result of a mutating request.
    Outcome(Outcome),
    /// Current karma of a post; `None` when the post does not exist.
    Karma {
        /// The post that was read.
        post_id: PostId,
        /// Its karma, if it exists.
        karma: Option<i64>,
    },
    /// A user's feed.
    Feed {
        /// Posts, highest karma first.
        posts: Vec<Post>,
    },
    /// A user's received direct messages.
    DirectMessages {
        /// Messages in arrival order.
        messages: Vec<DirectMessage>,
    },
}

impl Response {
    /// Return the outcome if this is an [`Response::Outcome`].
    pub fn into_outcome(self) -> Option<Outcome> {
        match self {
            Self::Outcome(outcome) => Some(outcome),
            _ => None,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "Engine ready"),
            Self::Outcome(outcome) => write!(f, "{}", outcome.message),
            Self::Karma {
                post_id,
                karma: Some(karma),
            } => write!(f, "Post {post_id} karma: {karma}"),
            Self::Karma {
                post_id,
                karma: None,
            } => write!(f, "Post {post_id} does not exist"),
            Self::Feed { posts } => write!(f, "Feed with {} posts", posts.len()),
            Self::DirectMessages { messages } => {
                write!(f, "{} direct messages", messages.len())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Delivery handles
// ---------------------------------------------------------------------------

/// Reply sink for engine responses.
///
/// Carries the requester's identity (used as the sender of direct messages)
/// and a channel into the requester's inbox. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct DeliveryHandle {
    identity: String,
    sender: mpsc::UnboundedSender<Response>,
}

impl DeliveryHandle {
    /// Create a handle and the inbox it delivers into.
    pub fn channel(identity: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<Response>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                identity: identity.into(),
                sender,
            },
            receiver,
        )
    }

    /// The requester's identity.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Push a response into the inbox.
    ///
    /// Returns `false` when the inbox has been dropped.
    pub fn deliver(&self, response: Response) -> bool {
        self.sender.send(response).is_ok()
    }

    /// Whether the inbox has been dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Routing-only reference that does not keep the inbox open.
    pub fn downgrade(&self) -> WeakDeliveryHandle {
        WeakDeliveryHandle {
            identity: self.identity.clone(),
            sender: self.sender.downgrade(),
        }
    }
}

/// Non-owning form of a [`DeliveryHandle`], stored by the engine per user.
#[derive(Debug, Clone)]
pub struct WeakDeliveryHandle {
    identity: String,
    sender: mpsc::WeakUnboundedSender<Response>,
}

impl WeakDeliveryHandle {
    /// Recover a usable handle if the inbox is still open.
    pub fn upgrade(&self) -> Option<DeliveryHandle> {
        self.sender.upgrade().map(|sender| DeliveryHandle {
            identity: self.identity.clone(),
            sender,
        })
    }
}

/// A request paired with where its answer goes.
#[derive(Debug)]
pub struct Envelope {
    /// The request.
    pub request: Request,
    /// The reply sink.
    pub reply_to: DeliveryHandle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_classification() {
        assert_eq!(Request::Ready.access(), Access::None);
        let feed = Request::GetFeed {
            username: "alice".to_owned(),
        };
        assert_eq!(feed.access(), Access::Shared);
        let vote = Request::Vote {
            post_id: PostId::from_raw(1),
            username: "alice".to_owned(),
            upvote: true,
        };
        assert_eq!(vote.access(), Access::Exclusive);
        let dm = Request::ReplyDirectMessage {
            to: "bob".to_owned(),
            content: "hi".to_owned(),
            timestamp: 0,
        };
        assert_eq!(dm.access(), Access::Exclusive);
    }

    #[test]
    fn rejection_becomes_failed_outcome() {
        let outcome = Outcome::from(Rejection::SubredditExists {
            name: "golang".to_owned(),
        });
        assert!(!outcome.success);
        assert_eq!(outcome.failure, Some(FailureKind::UniquenessViolation));
        assert_eq!(outcome.message, "Subreddit already exists");
    }

    #[test]
    fn request_json_is_tagged() {
        let json = serde_json::to_value(Request::Register {
            username: "alice".to_owned(),
        })
        .unwrap_or_default();
        assert_eq!(json["type"], "register");
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn weak_handle_does_not_keep_inbox_alive() {
        let (handle, mut inbox) = DeliveryHandle::channel("alice");
        let weak = handle.downgrade();
        assert_eq!(weak.upgrade().map(|h| h.identity().to_owned()).as_deref(), Some("alice"));
        assert!(handle.deliver(Response::Ready));
        assert_eq!(inbox.try_recv().ok(), Some(Response::Ready));

        drop(handle);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn deliver_to_dropped_inbox_reports_false() {
        let (handle, inbox) = DeliveryHandle::channel("bob");
        drop(inbox);
        assert!(handle.is_closed());
        assert!(!handle.deliver(Response::Ready));
    }
}
