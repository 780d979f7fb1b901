//! Process configuration from environment variables.

use std::time::Duration;

/// Default interval between notification scheduler polls (seconds).
const DEFAULT_SCHEDULER_POLL_SECS: u64 = 10;

/// Default interval between result prefetch passes (seconds).
const DEFAULT_PREFETCH_POLL_SECS: u64 = 5;

/// Default HTTP listen port.
const DEFAULT_PORT: u16 = 3000;

/// Runtime configuration for the server process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Whether the notification scheduler loop runs in this process.
    ///
    /// Enabled only in production-like environments so that local and test
    /// instances sharing a database never send email. Configure via
    /// `AGORA_ENV`.
    pub scheduler_enabled: bool,

    /// Interval between scheduler polls.
    ///
    /// Default: 10 seconds. Configure via `AGORA_SCHEDULER_POLL_SECS`.
    pub scheduler_poll_interval: Duration,

    /// Interval between result prefetch passes.
    ///
    /// Default: 5 seconds. Configure via `AGORA_PREFETCH_POLL_SECS`.
    pub prefetch_poll_interval: Duration,

    /// HTTP listen port. Default: 3000. Configure via `AGORA_PORT`.
    pub port: u16,
}

impl AppConfig {
    pub fn new() -> Self {
        AppConfig {
            scheduler_enabled: false,
            scheduler_poll_interval: Duration::from_secs(DEFAULT_SCHEDULER_POLL_SECS),
            prefetch_poll_interval: Duration::from_secs(DEFAULT_PREFETCH_POLL_SECS),
            port: DEFAULT_PORT,
        }
    }

    /// Creates an `AppConfig` from environment variables.
    pub fn from_env() -> Self {
        let env_name = std::env::var("AGORA_ENV").ok();
        let scheduler_poll = std::env::var("AGORA_SCHEDULER_POLL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_SCHEDULER_POLL_SECS);
        let prefetch_poll = std::env::var("AGORA_PREFETCH_POLL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_PREFETCH_POLL_SECS);
        let port = std::env::var("AGORA_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        AppConfig {
            scheduler_enabled: scheduler_enabled_for(env_name.as_deref()),
            scheduler_poll_interval: Duration::from_secs(scheduler_poll),
            prefetch_poll_interval: Duration::from_secs(prefetch_poll),
            port,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether the scheduler runs for a given `AGORA_ENV` value.
///
/// Only production-like environments qualify; unset or unrecognized values
/// leave the scheduler off.
fn scheduler_enabled_for(env_name: Option<&str>) -> bool {
    matches!(env_name, Some("production") | Some("preprod"))
}
