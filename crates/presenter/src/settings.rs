//! Presenter configuration.
//!
//! Environment variables with code defaults; the binary loads `.env` first
//! via `dotenvy`. Nothing here is persisted; sync state does not survive a
//! presenter restart.

use tokio::time::Duration;

use crate::monitor::HeartbeatConfig;

/// Runtime settings for a presenter process.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Broadcast channel name shared with the audience window.
    pub channel: String,
    /// URL the audience window is opened on (also the copyable fallback
    /// when the host blocks the popup).
    pub audience_url: String,
    pub heartbeat: HeartbeatConfig,
    /// Polling period for hosts that never emit permission-change events.
    pub permission_poll: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            channel: "podium-lesson".into(),
            audience_url: "podium://audience/podium-lesson".into(),
            heartbeat: HeartbeatConfig::default(),
            permission_poll: Duration::from_secs(5),
        }
    }
}

impl Settings {
    /// Load from the environment, falling back to the defaults above.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let channel = std::env::var("PODIUM_CHANNEL").unwrap_or(defaults.channel);
        let audience_url = std::env::var("PODIUM_AUDIENCE_URL")
            .unwrap_or_else(|_| format!("podium://audience/{channel}"));
        Self {
            audience_url,
            heartbeat: HeartbeatConfig {
                interval: env_secs("PODIUM_HEARTBEAT_INTERVAL_SECS", defaults.heartbeat.interval),
                timeout: env_secs("PODIUM_HEARTBEAT_TIMEOUT_SECS", defaults.heartbeat.timeout),
            },
            permission_poll: env_secs("PODIUM_PERMISSION_POLL_SECS", defaults.permission_poll),
            channel,
        }
    }
}

fn env_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}
