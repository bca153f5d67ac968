//! Gateway binary for the Agora social simulation.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `agora-config.yaml`
//! 3. Create the workload driver (idle until `POST /start-simulation`)
//! 4. Serve the HTTP gateway until `Ctrl-C`
//! 5. Stop the engine and clients of a finished run

mod error;

use std::path::Path;
use std::sync::Arc;

use agora_core::config::{AgoraConfig, DEFAULT_CONFIG_PATH};
use agora_core::driver::WorkloadDriver;
use agora_observer::state::AppState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the gateway fails
/// to start.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_env_err| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("agora-server starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        num_clients = config.simulation.num_clients,
        subreddits = config.simulation.subreddits.len(),
        vote_ack = ?config.engine.vote_ack,
        id_provider = ?config.engine.id_provider,
        seed = ?config.simulation.seed,
        "Configuration loaded"
    );

    // 3. Create the driver.
    let driver = Arc::new(WorkloadDriver::from_config(&config));
    let state = Arc::new(AppState::new(Arc::clone(&driver)));

    // 4. Serve.
    let gateway = agora_observer::spawn_gateway(&config.server, state).map_err(AppError::from)?;
    gateway.await.map_err(|e| AppError::Task {
        message: e.to_string(),
    })?;

    // 5. Tear down.
    match driver.shutdown().await {
        Ok(Some(stats)) => info!(
            users = stats.users,
            posts = stats.posts,
            comments = stats.comments,
            direct_messages = stats.direct_messages,
            "Engine stopped"
        ),
        Ok(None) => info!("No simulation was run"),
        Err(e) => warn!(error = %e, "Engine shutdown failed"),
    }

    info!("agora-server stopped");
    Ok(())
}

/// Load configuration from `agora-config.yaml`, falling back to defaults.
fn load_config() -> Result<AgoraConfig, AppError> {
    let config_path = Path::new(DEFAULT_CONFIG_PATH);
    if !config_path.exists() {
        info!("Config file not found, using defaults");
    }
    Ok(AgoraConfig::load_or_default(config_path)?)
}
