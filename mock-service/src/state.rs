//! Application state for the mock service.

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::config::AppConfig;

use crate::fixtures::Fixtures;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub fixtures: Arc<Fixtures>,
    /// Artificial delay added to every `/api/v1` request.
    pub latency: Duration,
    pub started: Instant,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: AppConfig, fixtures: Fixtures) -> Self {
        Self {
            config,
            fixtures: Arc::new(fixtures),
            latency: Duration::ZERO,
            started: Instant::now(),
        }
    }

    /// State over the demo fixtures, for tests and local runs.
    pub fn demo() -> Self {
        Self::new(
            AppConfig::load_with_service(crate::SERVICE_NAME),
            Fixtures::demo(),
        )
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}
