//! Request dispatch: turns a [`Request`] into state operations and
//! [`Response`] values.
//!
//! [`query`] answers read-only requests against a shared borrow of the
//! state. [`mutate`] answers everything else against an exclusive borrow.
//! The mailbox decides which one to call from [`Request::access`].

use tracing::{debug, trace};

use crate::karma::{self, VoteAckPolicy, VoteDirection};
use crate::protocol::{DeliveryHandle, Outcome, OutcomePayload, Request, Response};
use crate::store::EngineState;

/// Answer a request that needs at most shared access.
///
/// Returns `None` for mutating requests.
pub fn query(state: &EngineState, request: &Request) -> Option<Response> {
    match request {
        Request::Ready => Some(Response::Ready),
        Request::GetKarma { post_id } => Some(Response::Karma {
            post_id: *post_id,
            karma: state.karma(*post_id),
        }),
        Request::GetFeed { username } => Some(Response::Feed {
            posts: state.feed(username),
        }),
        Request::GetDirectMessages { username } => Some(Response::DirectMessages {
            messages: state.direct_messages(username),
        }),
        Request::Register { .. }
        | Request::CreateSubreddit { .. }
        | Request::JoinSubreddit { .. }
        | Request::LeaveSubreddit { .. }
        | Request::CreatePost { .. }
        | Request::CreateComment { .. }
        | Request::Vote { .. }
        | Request::ReplyDirectMessage { .. } => None,
    }
}

/// Apply a request under exclusive access and build its responses.
///
/// `caller` is the requester's reply sink; it is stored on `Register` and
/// its identity is the sender of `ReplyDirectMessage`. Read-only requests
/// are answered through [`query`].
pub fn mutate(
    state: &mut EngineState,
    request: Request,
    caller: &DeliveryHandle,
    vote_ack: VoteAckPolicy,
) -> Vec<Response> {
    let kind = request.kind();
    let outcomes: Vec<Outcome> = match request {
        Request::Register { username } => vec![
            state
                .register(&username, caller)
                .map_or_else(Outcome::from, |()| Outcome::ok("Registered successfully")),
        ],

        Request::CreateSubreddit { name, description } => vec![
            state
                .create_subreddit(&name, &description)
                .map_or_else(Outcome::from, |()| {
                    debug!(
                        subreddit = %name,
                        description = state.subreddit_description(&name),
                        "Subreddit created"
                    );
                    Outcome::ok("Subreddit created successfully")
                }),
        ],

        Request::JoinSubreddit {
            subreddit,
            username,
        } => vec![
            state
                .join_subreddit(&subreddit, &username)
                .map_or_else(Outcome::from, |()| {
                    Outcome::ok("Joined subreddit successfully")
                }),
        ],

        Request::LeaveSubreddit {
            subreddit,
            username,
        } => vec![
            state
                .leave_subreddit(&subreddit, &username)
                .map_or_else(Outcome::from, |()| Outcome::ok("Left subreddit successfully")),
        ],

        Request::CreatePost {
            subreddit,
            username,
            title,
            content,
        } => vec![
            state
                .create_post(&subreddit, &username, &title, &content)
                .map_or_else(Outcome::from, |post_id| {
                    Outcome::ok(format!("Posted successfully. Post ID: {post_id}"))
                        .with_payload(OutcomePayload::PostCreated { post_id })
                }),
        ],

        Request::CreateComment {
            post_id,
            parent_id,
            username,
            content,
            upvote,
        } => vec![
            state
                .create_comment(post_id, parent_id, &username, &content, upvote)
                .map_or_else(Outcome::from, |(comment_id, karma)| {
                    let direction = VoteDirection::from_upvote(upvote);
                    Outcome::ok(karma::comment_message(direction, comment_id, karma))
                        .with_payload(OutcomePayload::CommentCreated { comment_id, karma })
                }),
        ],

        Request::Vote {
            post_id,
            username,
            upvote,
        } => match state.vote(post_id, &username, upvote) {
            Ok(receipt) => receipt.acknowledgements(vote_ack),
            Err(rejection) => vec![Outcome::from(rejection)],
        },

        Request::ReplyDirectMessage {
            to,
            content,
            timestamp,
        } => {
            state.reply_direct_message(caller.identity(), &to, &content, timestamp);
            // Stored only; the recipient reads it with GetDirectMessages.
            debug!(
                from = caller.identity(),
                to = %to,
                recipient_online = state.delivery_handle(&to).is_some(),
                "Direct message stored"
            );
            vec![Outcome::ok("Direct message sent")]
        }

        read_only @ (Request::Ready
        | Request::GetKarma { .. }
        | Request::GetFeed { .. }
        | Request::GetDirectMessages { .. }) => {
            return query(state, &read_only).into_iter().collect();
        }
    };

    for outcome in &outcomes {
        if outcome.success {
            trace!(request = kind, caller = caller.identity(), "Request applied");
        } else {
            debug!(
                request = kind,
                caller = caller.identity(),
                failure = ?outcome.failure,
                message = %outcome.message,
                "Request rejected"
            );
        }
    }

    outcomes.into_iter().map(Response::Outcome).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::Arc;

    use agora_types::PostId;

    use super::*;
    use crate::error::FailureKind;
    use crate::ids::SequentialIdProvider;

    fn setup() -> (EngineState, DeliveryHandle) {
        let state = EngineState::new(Arc::new(SequentialIdProvider::new(1)));
        let (caller, _inbox) = DeliveryHandle::channel("alice");
        (state, caller)
    }

    fn single_outcome(responses: Vec<Response>) -> Outcome {
        assert_eq!(responses.len(), 1);
        responses.into_iter().next().and_then(Response::into_outcome).unwrap()
    }

    #[test]
    fn query_ignores_mutations() {
        let (state, _) = setup();
        let request = Request::Register {
            username: "alice".to_owned(),
        };
        assert!(query(&state, &request).is_none());
        assert_eq!(query(&state, &Request::Ready), Some(Response::Ready));
    }

    #[test]
    fn karma_query_for_missing_post_is_none() {
        let (state, _) = setup();
        let post_id = PostId::from_raw(77);
        assert_eq!(
            query(&state, &Request::GetKarma { post_id }),
            Some(Response::Karma {
                post_id,
                karma: None
            })
        );
    }

    #[test]
    fn create_post_reports_id_in_message_and_payload() {
        let (mut state, caller) = setup();
        let policy = VoteAckPolicy::Single;
        mutate(
            &mut state,
            Request::CreateSubreddit {
                name: "golang".to_owned(),
                description: String::new(),
            },
            &caller,
            policy,
        );
        mutate(
            &mut state,
            Request::JoinSubreddit {
                subreddit: "golang".to_owned(),
                username: "alice".to_owned(),
            },
            &caller,
            policy,
        );
        let outcome = single_outcome(mutate(
            &mut state,
            Request::CreatePost {
                subreddit: "golang".to_owned(),
                username: "alice".to_owned(),
                title: "Hi".to_owned(),
                content: "World".to_owned(),
            },
            &caller,
            policy,
        ));
        assert!(outcome.success);
        let Some(OutcomePayload::PostCreated { post_id }) = outcome.payload else {
            panic!("missing payload");
        };
        assert_eq!(
            outcome.message,
            format!("Posted successfully. Post ID: {post_id}")
        );
    }

    #[test]
    fn vote_on_missing_post_is_a_single_failure() {
        let (mut state, caller) = setup();
        let responses = mutate(
            &mut state,
            Request::Vote {
                post_id: PostId::from_raw(1),
                username: "alice".to_owned(),
                upvote: true,
            },
            &caller,
            VoteAckPolicy::Double,
        );
        let outcome = single_outcome(responses);
        assert!(!outcome.success);
        assert_eq!(outcome.failure, Some(FailureKind::MissingReferent));
        assert_eq!(outcome.message, "Post does not exist");
    }

    #[test]
    fn direct_message_sender_is_caller_identity() {
        let (mut state, caller) = setup();
        let outcome = single_outcome(mutate(
            &mut state,
            Request::ReplyDirectMessage {
                to: "bob".to_owned(),
                content: "hello".to_owned(),
                timestamp: 10,
            },
            &caller,
            VoteAckPolicy::Single,
        ));
        assert!(outcome.success);
        let inbox = state.direct_messages("bob");
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox.first().map(|m| m.from.as_str()), Some("alice"));
    }

    #[test]
    fn direct_message_is_stored_not_pushed_to_recipient() {
        let (mut state, caller) = setup();
        let (bob, mut bob_inbox) = DeliveryHandle::channel("bob");
        mutate(
            &mut state,
            Request::Register {
                username: "bob".to_owned(),
            },
            &bob,
            VoteAckPolicy::Single,
        );
        assert!(state.delivery_handle("bob").is_some());

        let outcome = single_outcome(mutate(
            &mut state,
            Request::ReplyDirectMessage {
                to: "bob".to_owned(),
                content: "psst".to_owned(),
                timestamp: 3,
            },
            &caller,
            VoteAckPolicy::Single,
        ));
        assert!(outcome.success);
        assert!(bob_inbox.try_recv().is_err());
        assert_eq!(state.direct_messages("bob").len(), 1);
    }

    #[test]
    fn mutate_answers_read_only_requests_too() {
        let (mut state, caller) = setup();
        let responses = mutate(
            &mut state,
            Request::GetFeed {
                username: "alice".to_owned(),
            },
            &caller,
            VoteAckPolicy::Single,
        );
        assert_eq!(responses, vec![Response::Feed { posts: Vec::new() }]);
    }
}
