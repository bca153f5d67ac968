//! The engine's mailbox, dispatcher task, and caller-side handle.
//!
//! [`spawn_engine`] moves an [`EngineState`] behind one reader/writer lock and
//! starts a dispatcher that drains a bounded mailbox in arrival order:
//!
//! - mutating requests take the write lock inline, so they apply one at a
//!   time in mailbox order;
//! - read-only requests take a read guard inline, then answer on a spawned
//!   task so several reads can overlap;
//! - `Ready` is answered immediately.
//!
//! Because every lock is acquired in mailbox order, one sender always sees
//! its own requests answered in the order it sent them.

use std::sync::Arc;
use std::time::Duration;

use agora_types::PostId;
use tokio::sync::{RwLock, mpsc, oneshot};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::handlers;
use crate::ids::IdProvider;
use crate::karma::VoteAckPolicy;
use crate::protocol::{Access, DeliveryHandle, Envelope, Outcome, Request, Response};
use crate::store::{EngineState, EngineStats};

/// Identity used for internal round-trips such as the readiness probe.
const SYSTEM_IDENTITY: &str = "system";

/// Messages accepted by the dispatcher.
#[derive(Debug)]
pub enum Command {
    /// A protocol request and its reply sink.
    Deliver(Envelope),
    /// Stop accepting work and report final counts.
    Shutdown {
        /// Receives the state counts at shutdown.
        responder: oneshot::Sender<EngineStats>,
    },
}

/// Start an engine and return a handle to its mailbox.
///
/// Must be called from within a tokio runtime.
pub fn spawn_engine(config: &EngineConfig, ids: Arc<dyn IdProvider>) -> EngineHandle {
    let (sender, receiver) = mpsc::channel(config.mailbox_capacity.max(1));
    let state = Arc::new(RwLock::new(EngineState::new(ids)));

    info!(
        mailbox_capacity = config.mailbox_capacity,
        vote_ack = ?config.vote_ack,
        "Engine started"
    );

    tokio::spawn(run_dispatch_loop(state, receiver, config.vote_ack));

    EngineHandle { sender }
}

async fn run_dispatch_loop(
    state: Arc<RwLock<EngineState>>,
    mut receiver: mpsc::Receiver<Command>,
    vote_ack: VoteAckPolicy,
) {
    debug!("Engine dispatcher started");

    while let Some(command) = receiver.recv().await {
        match command {
            Command::Deliver(envelope) => dispatch(&state, envelope, vote_ack).await,
            Command::Shutdown { responder } => {
                receiver.close();
                let final_counts = state.read().await.stats();
                info!(
                    users = final_counts.users,
                    subreddits = final_counts.subreddits,
                    posts = final_counts.posts,
                    comments = final_counts.comments,
                    direct_messages = final_counts.direct_messages,
                    "Engine shutting down"
                );
                if responder.send(final_counts).is_err() {
                    debug!("Shutdown requester went away before stats were sent");
                }
                break;
            }
        }
    }

    debug!("Engine dispatcher stopped");
}

async fn dispatch(state: &Arc<RwLock<EngineState>>, envelope: Envelope, vote_ack: VoteAckPolicy) {
    let Envelope { request, reply_to } = envelope;
    let kind = request.kind();

    match request.access() {
        Access::None => deliver(&reply_to, kind, Response::Ready),

        Access::Shared => {
            let guard = Arc::clone(state).read_owned().await;
            tokio::spawn(async move {
                if let Some(response) = handlers::query(&guard, &request) {
                    deliver(&reply_to, kind, response);
                }
            });
        }

        Access::Exclusive => {
            let responses = {
                let mut guard = state.write().await;
                handlers::mutate(&mut guard, request, &reply_to, vote_ack)
            };
            for response in responses {
                deliver(&reply_to, kind, response);
            }
        }
    }
}

fn deliver(reply_to: &DeliveryHandle, request: &'static str, response: Response) {
    if !reply_to.deliver(response) {
        debug!(
            request,
            identity = reply_to.identity(),
            "Reply sink closed, response discarded"
        );
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Clone-able handle to a running engine.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    sender: mpsc::Sender<Command>,
}

impl EngineHandle {
    /// Enqueue a request; responses go to `reply_to`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MailboxClosed`] if the engine has shut down.
    pub async fn send(&self, request: Request, reply_to: &DeliveryHandle) -> Result<(), EngineError> {
        self.sender
            .send(Command::Deliver(Envelope {
                request,
                reply_to: reply_to.clone(),
            }))
            .await
            .map_err(|_send_err| EngineError::MailboxClosed)
    }

    /// Send a request through a temporary inbox and return the first
    /// response.
    ///
    /// Any further responses (the second acknowledgment of a vote under
    /// [`VoteAckPolicy::Double`]) are discarded with the inbox.
    ///
    /// # Errors
    ///
    /// - [`EngineError::MailboxClosed`] if the engine has shut down.
    /// - [`EngineError::NoReply`] if the engine dropped the request unanswered.
    pub async fn request(&self, request: Request, identity: &str) -> Result<Response, EngineError> {
        let kind = request.kind();
        let (reply_to, mut inbox) = DeliveryHandle::channel(identity);
        self.send(request, &reply_to).await?;
        drop(reply_to);
        inbox
            .recv()
            .await
            .ok_or(EngineError::NoReply { request: kind })
    }

    /// [`request`](Self::request) bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// As [`request`](Self::request), plus [`EngineError::Timeout`].
    pub async fn request_timeout(
        &self,
        request: Request,
        identity: &str,
        timeout: Duration,
    ) -> Result<Response, EngineError> {
        let kind = request.kind();
        tokio::time::timeout(timeout, self.request(request, identity))
            .await
            .map_err(|_elapsed| EngineError::Timeout {
                request: kind,
                timeout_ms: duration_ms(timeout),
            })?
    }

    /// Round-trip a mutating request and return its [`Outcome`].
    ///
    /// # Errors
    ///
    /// As [`request`](Self::request), plus [`EngineError::UnexpectedResponse`]
    /// if the engine answered with something other than an outcome.
    pub async fn request_outcome(
        &self,
        request: Request,
        identity: &str,
    ) -> Result<Outcome, EngineError> {
        let kind = request.kind();
        match self.request(request, identity).await? {
            Response::Outcome(outcome) => Ok(outcome),
            other => Err(EngineError::UnexpectedResponse {
                request: kind,
                response: other.to_string(),
            }),
        }
    }

    /// Current karma of a post, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// As [`request`](Self::request).
    pub async fn karma(&self, post_id: PostId) -> Result<Option<i64>, EngineError> {
        let request = Request::GetKarma { post_id };
        let kind = request.kind();
        match self.request(request, SYSTEM_IDENTITY).await? {
            Response::Karma { karma, .. } => Ok(karma),
            other => Err(EngineError::UnexpectedResponse {
                request: kind,
                response: other.to_string(),
            }),
        }
    }

    /// Wait for the readiness acknowledgment.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotReady`] if no acknowledgment arrives in `timeout`.
    /// - [`EngineError::MailboxClosed`] if the engine has shut down.
    pub async fn wait_ready(&self, timeout: Duration) -> Result<(), EngineError> {
        match self
            .request_timeout(Request::Ready, SYSTEM_IDENTITY, timeout)
            .await
        {
            Ok(Response::Ready) => Ok(()),
            Ok(other) => Err(EngineError::UnexpectedResponse {
                request: "ready",
                response: other.to_string(),
            }),
            Err(EngineError::Timeout { timeout_ms, .. }) => Err(EngineError::NotReady { timeout_ms }),
            Err(e) => Err(e),
        }
    }

    /// Stop the engine and return its final counts.
    ///
    /// Requests still queued behind the shutdown are dropped unanswered.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MailboxClosed`] if the engine already stopped.
    pub async fn shutdown(&self) -> Result<EngineStats, EngineError> {
        let (responder, rx) = oneshot::channel();
        self.sender
            .send(Command::Shutdown { responder })
            .await
            .map_err(|_send_err| EngineError::MailboxClosed)?;
        rx.await.map_err(|_recv_err| EngineError::MailboxClosed)
    }

    /// Whether the engine is still accepting requests.
    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ids::SequentialIdProvider;

    fn engine() -> EngineHandle {
        spawn_engine(
            &EngineConfig::default(),
            Arc::new(SequentialIdProvider::new(1)),
        )
    }

    #[tokio::test]
    async fn ready_round_trip() {
        let handle = engine();
        assert!(handle.wait_ready(Duration::from_secs(1)).await.is_ok());
        assert!(handle.is_running());
    }

    #[tokio::test]
    async fn shutdown_closes_mailbox() {
        let handle = engine();
        let stats = handle.shutdown().await.unwrap();
        assert_eq!(stats, EngineStats::default());
        assert!(!handle.is_running());
        assert_eq!(
            handle.wait_ready(Duration::from_millis(50)).await,
            Err(EngineError::MailboxClosed)
        );
        assert_eq!(handle.shutdown().await, Err(EngineError::MailboxClosed));
    }

    #[tokio::test]
    async fn zero_capacity_is_clamped() {
        let config = EngineConfig {
            mailbox_capacity: 0,
            ..EngineConfig::default()
        };
        let handle = spawn_engine(&config, Arc::new(SequentialIdProvider::new(1)));
        assert!(handle.wait_ready(Duration::from_secs(1)).await.is_ok());
    }

    #[tokio::test]
    async fn karma_of_missing_post_is_none() {
        let handle = engine();
        assert_eq!(handle.karma(PostId::from_raw(5)).await, Ok(None));
    }

    #[tokio::test]
    async fn outcome_request_rejects_query_responses() {
        let handle = engine();
        let result = handle
            .request_outcome(
                Request::GetFeed {
                    username: "alice".to_owned(),
                },
                "alice",
            )
            .await;
        assert!(matches!(
            result,
            Err(EngineError::UnexpectedResponse {
                request: "get_feed",
                ..
            })
        ));
    }

    #[test]
    fn duration_conversion_saturates() {
        assert_eq!(duration_ms(Duration::from_millis(250)), 250);
        assert_eq!(duration_ms(Duration::MAX), u64::MAX);
    }
}
