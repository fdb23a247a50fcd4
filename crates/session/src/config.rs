// FILE: crates/session/src/config.rs

use audiofolio_config::PlayerConfig;
use std::time::Duration;

/// Tuning of a playback session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Progress tick while playing
    pub tick_interval: Duration,
    /// Every Nth tick writes the position
    pub checkpoint_every_ticks: u32,
    /// Seeks landing this close to the end count as completion
    pub completion_threshold_ms: u64,
    pub seek_step_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&PlayerConfig::default())
    }
}

impl From<&PlayerConfig> for SessionConfig {
    fn from(config: &PlayerConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(config.tick_interval_ms),
            checkpoint_every_ticks: config.checkpoint_every_ticks.max(1),
            completion_threshold_ms: config.completion_threshold_ms,
            seek_step_ms: config.seek_step_secs.saturating_mul(1000),
        }
    }
}
