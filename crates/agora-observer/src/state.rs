//! Shared application state for the HTTP gateway.

use std::sync::Arc;

use agora_core::driver::WorkloadDriver;
use chrono::{DateTime, Utc};

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The workload driver whose mirrors back every read endpoint.
    pub driver: Arc<WorkloadDriver>,
    /// When the gateway state was created.
    pub booted_at: DateTime<Utc>,
}

impl AppState {
    /// Create application state around a driver.
    pub fn new(driver: Arc<WorkloadDriver>) -> Self {
        Self {
            driver,
            booted_at: Utc::now(),
        }
    }
}
