//! Gateway startup helper.
//!
//! Provides [`spawn_gateway`] which launches the HTTP server on a
//! background Tokio task so the binary can hold its handle.
//!
//! # Usage
//!
//! ```rust,ignore
//! use agora_core::config::ServerConfig;
//! use agora_observer::startup::spawn_gateway;
//! use agora_observer::state::AppState;
//! use std::sync::Arc;
//!
//! let state = Arc::new(AppState::new(driver));
//! let handle = spawn_gateway(&ServerConfig::default(), state)?;
//! handle.await?;
//! ```

use std::sync::Arc;

use agora_core::config::ServerConfig;
use tokio::task::JoinHandle;

use crate::server::{ServerError, parse_addr, start_server};
use crate::state::AppState;

/// Errors that can occur when spawning the gateway.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server configuration was rejected.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Spawn the gateway HTTP server on a background Tokio task.
///
/// The server runs until `Ctrl-C`, the Tokio runtime shuts down, or the
/// task is aborted.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the configured address does not
/// parse. Bind failures surface later, logged from the background task.
pub fn spawn_gateway(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<JoinHandle<()>, StartupError> {
    let addr = parse_addr(config)?;
    let config = config.clone();

    let handle = tokio::spawn(async move {
        if let Err(e) = start_server(&config, state).await {
            tracing::error!(error = %e, "Gateway exited with error");
        }
    });

    tracing::info!(%addr, "Gateway spawned on background task");

    Ok(handle)
}
