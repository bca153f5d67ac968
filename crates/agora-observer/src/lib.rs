//! HTTP gateway for the Agora social simulation.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`POST /start-simulation`** to launch the one workload run
//! - **REST endpoints** for reading the driver's mirrors (status,
//!   communities, posts, comments, feeds, direct messages)
//! - **Minimal HTML page** (`GET /`) with live counts and endpoint links
//!
//! # Architecture
//!
//! Every read is served from the [`WorkloadDriver`]'s mirrors, never from
//! the engine. The gateway does not hold engine state and never blocks the
//! engine's mailbox.
//!
//! [`WorkloadDriver`]: agora_core::driver::WorkloadDriver

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use startup::{StartupError, spawn_gateway};
pub use state::AppState;
