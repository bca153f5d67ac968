//! The workload driver.
//!
//! [`WorkloadDriver::run`] performs one scripted simulation:
//!
//! 1. spawn the engine and wait (bounded) for its readiness acknowledgment;
//! 2. spawn `num_clients` clients named `user0..`;
//! 3. create every configured community;
//! 4. per client: join a random community, post there, comment on the post,
//!    maybe vote on an earlier post in the same community, maybe send a
//!    direct message to another client.
//!
//! Everything the driver asks for is also written to its [`Mirror`], which is
//! what the gateway reports. A driver runs at most once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use agora_engine::{
    EngineConfig, EngineError, EngineHandle, EngineStats, OutcomePayload, Request, spawn_engine,
};
use agora_types::{CommentId, PostId};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::client::Client;
use crate::config::{AgoraConfig, SimulationConfig};
use crate::content;
use crate::mirror::{
    Mirror, MirroredComment, MirroredMessage, MirroredPost, SimulationStatus,
};

/// Identity the driver uses for its own round-trips.
const DRIVER_IDENTITY: &str = "driver";

/// Characters of a comment shown in log lines.
const COMMENT_PREVIEW_CHARS: usize = 30;

/// Errors that end a simulation run.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// `run` was called on a driver that has already started.
    #[error("simulation already started")]
    AlreadyStarted,

    /// No communities are configured, so clients have nowhere to post.
    #[error("no subreddits configured")]
    NoSubreddits,

    /// The engine did not acknowledge readiness in time.
    #[error("engine not ready: {source}")]
    EngineNotReady {
        /// The underlying readiness failure.
        source: EngineError,
    },

    /// A message exchange with the engine failed mid-run.
    #[error("engine exchange failed: {source}")]
    Engine {
        /// The underlying engine error.
        #[from]
        source: EngineError,
    },
}

/// Counts of what one run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Clients spawned.
    pub clients: usize,
    /// Communities the engine accepted.
    pub subreddits: usize,
    /// Posts the engine accepted.
    pub posts: usize,
    /// Comments the engine accepted.
    pub comments: usize,
    /// Votes sent.
    pub votes: usize,
    /// Direct messages sent.
    pub direct_messages: usize,
    /// Wall-clock duration of the run.
    pub elapsed_ms: u64,
}

/// Engine and clients kept alive after a run.
#[derive(Debug)]
struct Running {
    engine: EngineHandle,
    clients: Vec<Client>,
}

/// Drives one simulation and keeps mirrors of it.
#[derive(Debug)]
pub struct WorkloadDriver {
    engine_config: EngineConfig,
    simulation: SimulationConfig,
    started: AtomicBool,
    mirror: RwLock<Mirror>,
    running: Mutex<Option<Running>>,
}

impl WorkloadDriver {
    /// Create an idle driver.
    pub fn new(engine_config: EngineConfig, simulation: SimulationConfig) -> Self {
        let mirror = Mirror::new(simulation.subreddits.clone());
        Self {
            engine_config,
            simulation,
            started: AtomicBool::new(false),
            mirror: RwLock::new(mirror),
            running: Mutex::new(None),
        }
    }

    /// Create an idle driver from the top-level configuration.
    pub fn from_config(config: &AgoraConfig) -> Self {
        Self::new(config.engine.clone(), config.simulation.clone())
    }

    /// Whether a run has been started.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    fn claim_start(&self) -> Result<(), DriverError> {
        self.started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_was| ())
            .map_err(|_was| DriverError::AlreadyStarted)
    }

    /// Run the simulation to completion.
    ///
    /// # Errors
    ///
    /// - [`DriverError::AlreadyStarted`] on every call after the first.
    /// - [`DriverError::NoSubreddits`] if none are configured.
    /// - [`DriverError::EngineNotReady`] if the readiness wait times out.
    /// - [`DriverError::Engine`] if the engine stops mid-run.
    pub async fn run(&self) -> Result<RunReport, DriverError> {
        self.claim_start()?;
        self.execute().await
    }

    /// Claim the single run and execute it on a background task.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::AlreadyStarted`] synchronously if a run was
    /// already claimed.
    pub fn start_in_background(
        self: &Arc<Self>,
    ) -> Result<JoinHandle<Result<RunReport, DriverError>>, DriverError> {
        self.claim_start()?;
        let driver = Arc::clone(self);
        Ok(tokio::spawn(async move {
            let result = driver.execute().await;
            if let Err(e) = &result {
                error!(error = %e, "Simulation failed");
            }
            result
        }))
    }

    async fn execute(&self) -> Result<RunReport, DriverError> {
        if self.simulation.subreddits.is_empty() {
            return Err(DriverError::NoSubreddits);
        }

        let start = Instant::now();
        info!(
            num_clients = self.simulation.num_clients,
            subreddits = self.simulation.subreddits.len(),
            started_at = %Utc::now().to_rfc3339(),
            "Simulation starting"
        );

        let ids = self
            .engine_config
            .id_provider
            .build(self.engine_config.node_tag);
        let engine = spawn_engine(&self.engine_config, ids);
        engine
            .wait_ready(self.engine_config.readiness_timeout())
            .await
            .map_err(|source| DriverError::EngineNotReady { source })?;

        let clients: Vec<Client> = (0..self.simulation.num_clients)
            .map(|i| Client::spawn(engine.clone(), format!("user{i}")))
            .collect();
        self.mirror.write().await.set_active_users(clients.len());

        let mut rng = self
            .simulation
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

        let mut report = RunReport {
            clients: clients.len(),
            ..RunReport::default()
        };

        let result = self
            .simulate_actions(&engine, &clients, &mut rng, &mut report)
            .await;

        report.elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            elapsed_ms = report.elapsed_ms,
            posts = report.posts,
            comments = report.comments,
            votes = report.votes,
            direct_messages = report.direct_messages,
            "Simulation finished"
        );

        *self.running.lock().await = Some(Running { engine, clients });
        result.map(|()| report)
    }

    async fn simulate_actions(
        &self,
        engine: &EngineHandle,
        clients: &[Client],
        rng: &mut StdRng,
        report: &mut RunReport,
    ) -> Result<(), DriverError> {
        for name in &self.simulation.subreddits {
            let outcome = engine
                .request_outcome(
                    Request::CreateSubreddit {
                        name: name.clone(),
                        description: format!("r/{name}"),
                    },
                    DRIVER_IDENTITY,
                )
                .await?;
            if outcome.success {
                report.subreddits = report.subreddits.saturating_add(1);
                info!(subreddit = %name, "Subreddit created");
            } else {
                warn!(subreddit = %name, message = %outcome.message, "Subreddit not created");
            }
        }

        for (i, client) in clients.iter().enumerate() {
            let Some(subreddit) = self.simulation.subreddits.choose(rng) else {
                return Err(DriverError::NoSubreddits);
            };
            let username = client.username();

            engine
                .send(
                    Request::JoinSubreddit {
                        subreddit: subreddit.clone(),
                        username: username.to_owned(),
                    },
                    client.delivery(),
                )
                .await?;
            debug!(client = username, subreddit = %subreddit, "Joined subreddit");

            let earlier = self
                .mirror
                .read()
                .await
                .posts_in(subreddit)
                .choose(rng)
                .map(|p| p.id);

            let Some(post_id) = self.create_post(engine, subreddit, username, rng).await? else {
                continue;
            };
            report.posts = report.posts.saturating_add(1);

            if self
                .create_comment(engine, post_id, subreddit, username, rng)
                .await?
            {
                report.comments = report.comments.saturating_add(1);
            }

            let target = earlier.filter(|_| rng.random::<f64>() < self.simulation.vote_chance);
            if let Some(target) = target {
                engine
                    .send(
                        Request::Vote {
                            post_id: target,
                            username: username.to_owned(),
                            upvote: rng.random::<bool>(),
                        },
                        client.delivery(),
                    )
                    .await?;
                report.votes = report.votes.saturating_add(1);
            }

            // A draw that lands on the sender itself sends nothing.
            if rng.random::<f64>() < self.simulation.direct_message_chance {
                let receiver_index = rng.random_range(0..clients.len());
                let receiver = clients.get(receiver_index).filter(|_| receiver_index != i);
                if let Some(receiver) = receiver {
                    self.send_direct_message(engine, client, receiver.username())
                        .await?;
                    report.direct_messages = report.direct_messages.saturating_add(1);
                }
            }
        }

        Ok(())
    }

    async fn create_post(
        &self,
        engine: &EngineHandle,
        subreddit: &str,
        username: &str,
        rng: &mut StdRng,
    ) -> Result<Option<PostId>, DriverError> {
        let generated = content::post(subreddit, rng);
        let outcome = engine
            .request_outcome(
                Request::CreatePost {
                    subreddit: subreddit.to_owned(),
                    username: username.to_owned(),
                    title: generated.title.to_owned(),
                    content: generated.content.to_owned(),
                },
                username,
            )
            .await?;

        let post_id = match outcome.payload {
            Some(OutcomePayload::PostCreated { post_id }) if outcome.success => post_id,
            _ => {
                warn!(client = username, subreddit, message = %outcome.message, "Post rejected");
                return Ok(None);
            }
        };

        self.mirror.write().await.record_post(MirroredPost {
            id: post_id,
            title: generated.title.to_owned(),
            content: generated.content.to_owned(),
            username: username.to_owned(),
            subreddit: subreddit.to_owned(),
        });
        info!(client = username, subreddit, title = generated.title, "Posted");
        Ok(Some(post_id))
    }

    async fn create_comment(
        &self,
        engine: &EngineHandle,
        post_id: PostId,
        subreddit: &str,
        username: &str,
        rng: &mut StdRng,
    ) -> Result<bool, DriverError> {
        let text = content::comment(subreddit, rng);
        let upvote = rng.random::<bool>();
        let outcome = engine
            .request_outcome(
                Request::CreateComment {
                    post_id,
                    parent_id: None,
                    username: username.to_owned(),
                    content: text.to_owned(),
                    upvote,
                },
                username,
            )
            .await?;

        let comment_id: CommentId = match outcome.payload {
            Some(OutcomePayload::CommentCreated { comment_id, .. }) if outcome.success => {
                comment_id
            }
            _ => {
                warn!(client = username, post_id = %post_id, message = %outcome.message, "Comment rejected");
                return Ok(false);
            }
        };

        self.mirror.write().await.record_comment(
            post_id,
            MirroredComment {
                id: comment_id,
                content: text.to_owned(),
                username: username.to_owned(),
                upvote,
            },
        );
        info!(
            client = username,
            subreddit,
            comment = %content::preview(text, COMMENT_PREVIEW_CHARS),
            "Commented"
        );
        Ok(true)
    }

    async fn send_direct_message(
        &self,
        engine: &EngineHandle,
        sender: &Client,
        to: &str,
    ) -> Result<(), DriverError> {
        let from = sender.username();
        let body = content::direct_message(from, to);
        let timestamp = Utc::now().timestamp_millis();
        engine
            .send(
                Request::ReplyDirectMessage {
                    to: to.to_owned(),
                    content: body.clone(),
                    timestamp,
                },
                sender.delivery(),
            )
            .await?;

        self.mirror.write().await.record_direct_message(
            to,
            MirroredMessage {
                from: from.to_owned(),
                content: body,
                timestamp,
            },
        );
        info!(from, to, "Direct message sent");
        Ok(())
    }

    /// Handle to the engine of a finished run.
    pub async fn engine(&self) -> Option<EngineHandle> {
        self.running
            .lock()
            .await
            .as_ref()
            .map(|running| running.engine.clone())
    }

    /// Stop the clients and the engine of a finished run.
    ///
    /// Returns `None` if no run has finished.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Engine`] if the engine had already stopped.
    pub async fn shutdown(&self) -> Result<Option<EngineStats>, DriverError> {
        let Some(running) = self.running.lock().await.take() else {
            return Ok(None);
        };
        for client in running.clients {
            client.stop();
        }
        Ok(Some(running.engine.shutdown().await?))
    }

    // -----------------------------------------------------------------------
    // Mirror queries
    // -----------------------------------------------------------------------

    /// Summary counts.
    pub async fn status(&self) -> SimulationStatus {
        self.mirror.read().await.status()
    }

    /// Configured communities.
    pub async fn subreddits(&self) -> Vec<String> {
        self.mirror.read().await.subreddits().to_vec()
    }

    /// Every mirrored post.
    pub async fn posts(&self) -> Vec<MirroredPost> {
        self.mirror.read().await.posts()
    }

    /// Mirrored comments on a post.
    pub async fn comments(&self, post_id: PostId) -> Vec<MirroredComment> {
        self.mirror.read().await.comments(post_id)
    }

    /// First few mirrored posts.
    pub async fn feed(&self, username: &str) -> Vec<MirroredPost> {
        self.mirror.read().await.feed(username)
    }

    /// Mirrored direct messages for a recipient.
    pub async fn direct_messages(&self, username: &str) -> Vec<MirroredMessage> {
        self.mirror.read().await.direct_messages(username)
    }
}
