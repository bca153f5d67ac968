//! Error types for the agora-engine crate.
//!
//! Two families live here:
//!
//! - [`Rejection`] -- a request was understood but refused by the current
//!   state. Rejections are ordinary values and travel back to the caller
//!   inside an [`Outcome`](crate::protocol::Outcome); they never abort.
//! - [`EngineError`] -- the request could not be exchanged with the engine
//!   at all (mailbox closed, no reply, deadline exceeded).

use agora_types::PostId;
use serde::{Deserialize, Serialize};

/// Classification of a rejected request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A username or community name is already taken.
    UniquenessViolation,
    /// A referenced community or post does not exist.
    MissingReferent,
    /// The acting user is not a member of the relevant community.
    AuthorizationGap,
}

/// A request refused by the engine.
///
/// The `Display` text is the human-readable message sent back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// Register with a username that is already registered.
    #[error("Username already exists")]
    UsernameTaken {
        /// The duplicate username.
        username: String,
    },

    /// `CreateSubreddit` with a name that is already taken.
    #[error("Subreddit already exists")]
    SubredditExists {
        /// The duplicate community name.
        name: String,
    },

    /// The referenced community does not exist.
    #[error("Subreddit does not exist")]
    SubredditNotFound {
        /// The missing community name.
        name: String,
    },

    /// The referenced post does not exist.
    #[error("Post does not exist")]
    PostNotFound {
        /// The missing post.
        post_id: PostId,
    },

    /// The acting user has not joined the community.
    #[error("You are not a member of this subreddit")]
    NotAMember {
        /// The community that gates the action.
        subreddit: String,
        /// The acting user.
        username: String,
    },
}

impl Rejection {
    /// Map this rejection onto the failure taxonomy.
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::UsernameTaken { .. } | Self::SubredditExists { .. } => {
                FailureKind::UniquenessViolation
            }
            Self::SubredditNotFound { .. } | Self::PostNotFound { .. } => {
                FailureKind::MissingReferent
            }
            Self::NotAMember { .. } => FailureKind::AuthorizationGap,
        }
    }
}

/// Errors raised while exchanging messages with the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The engine mailbox is closed; the engine has shut down.
    #[error("engine mailbox closed")]
    MailboxClosed,

    /// The engine dropped the reply sink without answering.
    #[error("engine did not reply to {request}")]
    NoReply {
        /// Kind of the unanswered request.
        request: &'static str,
    },

    /// The caller stopped waiting for a reply.
    #[error("timed out after {timeout_ms}ms waiting for reply to {request}")]
    Timeout {
        /// Kind of the request.
        request: &'static str,
        /// The deadline that elapsed.
        timeout_ms: u64,
    },

    /// The readiness round-trip did not complete within the bounded wait.
    #[error("engine not ready after {timeout_ms}ms")]
    NotReady {
        /// The deadline that elapsed.
        timeout_ms: u64,
    },

    /// The engine answered with a response of the wrong shape.
    #[error("unexpected response to {request}: {response}")]
    UnexpectedResponse {
        /// Kind of the request.
        request: &'static str,
        /// Rendering of the response that was received.
        response: String,
    },
}
