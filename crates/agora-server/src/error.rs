//! Error types for the gateway binary.
//!
//! [`AppError`] wraps every failure mode during startup and serving so
//! `main` can propagate with `?`.

/// Top-level error for the gateway binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: agora_core::config::ConfigError,
    },

    /// The gateway could not be started.
    #[error("gateway error: {source}")]
    Startup {
        /// The underlying startup error.
        #[from]
        source: agora_observer::StartupError,
    },

    /// The gateway task panicked or was cancelled.
    #[error("gateway task failed: {message}")]
    Task {
        /// Description of the task failure.
        message: String,
    },
}
