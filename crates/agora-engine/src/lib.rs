//! Authoritative state engine for the Agora social simulation.
//!
//! The engine owns users, communities, posts, comments, and direct messages.
//! Callers talk to it only through messages: a [`Request`] is enqueued on the
//! engine's mailbox together with a [`DeliveryHandle`], and the engine pushes
//! one or more [`Response`] values back into that handle.
//!
//! ```text
//!   caller ──Envelope──▶ mailbox ──▶ dispatcher ──▶ RwLock<EngineState>
//!      ▲                                  │
//!      └──────────── Response ────────────┘
//! ```
//!
//! # Modules
//!
//! - [`protocol`] -- Requests, responses, outcomes, delivery handles
//! - [`store`] -- Domain state and its operations
//! - [`karma`] -- Vote direction, authorization, acknowledgment policy
//! - [`handlers`] -- Request-to-operation dispatch
//! - [`mailbox`] -- Dispatcher task and [`EngineHandle`]
//! - [`ids`] -- Injected identifier providers
//! - [`config`] -- Engine settings
//! - [`error`] -- Rejections and engine errors

pub mod config;
pub mod error;
pub mod handlers;
pub mod ids;
pub mod karma;
pub mod mailbox;
pub mod protocol;
pub mod store;

pub use config::EngineConfig;
pub use error::{EngineError, FailureKind, Rejection};
pub use ids::{IdProvider, IdProviderKind, RandomIdProvider, SequentialIdProvider};
pub use karma::{VoteAckPolicy, VoteDirection};
pub use mailbox::{EngineHandle, spawn_engine};
pub use protocol::{DeliveryHandle, Outcome, OutcomePayload, Request, Response};
pub use store::{EngineState, EngineStats};
