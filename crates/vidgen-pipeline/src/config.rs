//! Pipeline configuration.

use std::time::Duration;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Longest a single step may stay `processing` before the watchdog
    /// fails the job
    pub max_step_duration: Duration,
    /// How often the watchdog scans active jobs
    pub watchdog_interval: Duration,
    /// Whether the watchdog runs at all
    pub watchdog_enabled: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_step_duration: Duration::from_secs(900), // 15 minutes
            watchdog_interval: Duration::from_secs(30),
            watchdog_enabled: true,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_step_duration: Duration::from_secs(
                std::env::var("VIDGEN_WATCHDOG_MAX_STEP_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(900),
            ),
            watchdog_interval: Duration::from_secs(
                std::env::var("VIDGEN_WATCHDOG_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            watchdog_enabled: std::env::var("VIDGEN_WATCHDOG_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }
}
