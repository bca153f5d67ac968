//! Workload driver and simulated clients for the Agora social simulation.
//!
//! This crate sits around the engine: it loads configuration, spawns the
//! engine and a population of clients, scripts their activity, and keeps
//! read-only mirrors of what it did for the HTTP gateway.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `agora-config.yaml` into
//!   strongly-typed structs.
//! - [`client`] -- [`Client`], a simulated user with its own inbox.
//! - [`content`] -- Canned post, comment, and message text.
//! - [`driver`] -- [`WorkloadDriver`], the scripted simulation run.
//! - [`mirror`] -- The driver's reporting mirrors.
//!
//! [`Client`]: client::Client
//! [`WorkloadDriver`]: driver::WorkloadDriver

pub mod client;
pub mod config;
pub mod content;
pub mod driver;
pub mod mirror;
