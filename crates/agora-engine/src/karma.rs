//! Karma rules: how votes move a post's counter and who may cast them.
//!
//! Two paths change karma. A comment always carries a vote and applies it
//! with no membership check. A direct vote requires the voter to be a member
//! of the post's community. Both move the counter by exactly one.
//!
//! A successful vote is acknowledged according to [`VoteAckPolicy`].

use std::collections::BTreeSet;

use agora_types::PostId;
use serde::Deserialize;

use crate::error::Rejection;
use crate::protocol::{Outcome, OutcomePayload};

/// Direction of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteDirection {
    /// Adds one to karma.
    Up,
    /// Subtracts one from karma.
    Down,
}

impl VoteDirection {
    /// Direction from the wire-level `upvote` flag.
    pub const fn from_upvote(upvote: bool) -> Self {
        if upvote { Self::Up } else { Self::Down }
    }

    /// Apply this vote to a karma value.
    pub const fn apply(self, karma: i64) -> i64 {
        match self {
            Self::Up => karma.saturating_add(1),
            Self::Down => karma.saturating_sub(1),
        }
    }

    /// Verb used in caller-facing messages.
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Up => "upvoted",
            Self::Down => "downvoted",
        }
    }
}

/// Check that `username` may vote in a community with the given members.
///
/// # Errors
///
/// Returns [`Rejection::NotAMember`] when the user has not joined.
pub fn authorize_vote(
    members: &BTreeSet<String>,
    subreddit: &str,
    username: &str,
) -> Result<(), Rejection> {
    if members.contains(username) {
        Ok(())
    } else {
        Err(Rejection::NotAMember {
            subreddit: subreddit.to_owned(),
            username: username.to_owned(),
        })
    }
}

/// How many success responses a vote produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteAckPolicy {
    /// One authoritative response.
    #[default]
    Single,
    /// A short acknowledgment followed by the detailed one.
    Double,
}

/// A vote that has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteReceipt {
    /// The post voted on.
    pub post_id: PostId,
    /// The voter.
    pub username: String,
    /// Vote direction.
    pub direction: VoteDirection,
    /// Karma after the vote.
    pub karma: i64,
}

impl VoteReceipt {
    /// Build the success responses owed to the voter.
    pub fn acknowledgements(&self, policy: VoteAckPolicy) -> Vec<Outcome> {
        let payload = OutcomePayload::Voted {
            post_id: self.post_id,
            karma: self.karma,
        };
        let detailed = Outcome::ok(format!(
            "User {} {} post {}. New karma: {}",
            self.username,
            self.direction.verb(),
            self.post_id,
            self.karma
        ))
        .with_payload(payload.clone());

        match policy {
            VoteAckPolicy::Single => vec![detailed],
            VoteAckPolicy::Double => vec![
                Outcome::ok(format!("Voted successfully. New karma: {}", self.karma))
                    .with_payload(payload),
                detailed,
            ],
        }
    }
}

/// Message for a successful comment and its attached vote.
pub fn comment_message(
    direction: VoteDirection,
    comment_id: impl core::fmt::Display,
    karma: i64,
) -> String {
    format!(
        "Commented and {} successfully. Comment ID: {comment_id}. New post karma: {karma}.",
        direction.verb()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn votes_move_karma_by_one() {
        assert_eq!(VoteDirection::Up.apply(0), 1);
        assert_eq!(VoteDirection::Down.apply(0), -1);
        assert_eq!(VoteDirection::Down.apply(-5), -6);
    }

    #[test]
    fn karma_saturates_at_bounds() {
        assert_eq!(VoteDirection::Up.apply(i64::MAX), i64::MAX);
        assert_eq!(VoteDirection::Down.apply(i64::MIN), i64::MIN);
    }

    #[test]
    fn from_upvote_flag() {
        assert_eq!(VoteDirection::from_upvote(true), VoteDirection::Up);
        assert_eq!(VoteDirection::from_upvote(false), VoteDirection::Down);
    }

    #[test]
    fn non_member_is_refused() {
        let mut members = BTreeSet::new();
        members.insert("alice".to_owned());
        assert!(authorize_vote(&members, "golang", "alice").is_ok());
        let err = authorize_vote(&members, "golang", "bob");
        assert!(matches!(err, Err(Rejection::NotAMember { .. })));
    }

    #[test]
    fn single_policy_acknowledges_once() {
        let receipt = VoteReceipt {
            post_id: PostId::from_raw(9),
            username: "alice".to_owned(),
            direction: VoteDirection::Up,
            karma: 3,
        };
        let acks = receipt.acknowledgements(VoteAckPolicy::Single);
        assert_eq!(acks.len(), 1);
        assert!(acks.iter().all(|o| o.success));
        assert!(acks.iter().any(|o| o.message.starts_with("User alice upvoted post")));
    }

    #[test]
    fn double_policy_acknowledges_twice_with_distinct_messages() {
        let receipt = VoteReceipt {
            post_id: PostId::from_raw(9),
            username: "bob".to_owned(),
            direction: VoteDirection::Down,
            karma: -1,
        };
        let acks = receipt.acknowledgements(VoteAckPolicy::Double);
        assert_eq!(acks.len(), 2);
        let messages: Vec<&str> = acks.iter().map(|o| o.message.as_str()).collect();
        assert_eq!(messages.first().copied(), Some("Voted successfully. New karma: -1"));
        assert!(messages.last().is_some_and(|m| m.contains("downvoted")));
    }

    #[test]
    fn comment_message_wording() {
        let msg = comment_message(VoteDirection::Up, "abc", 1);
        assert_eq!(
            msg,
            "Commented and upvoted successfully. Comment ID: abc. New post karma: 1."
        );
    }
}
