//! Player configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Playback session tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Progress tick interval while playing, in milliseconds
    pub tick_interval_ms: u64,

    /// Persist the position every N ticks
    pub checkpoint_every_ticks: u32,

    /// A seek landing this close to the end counts as completion
    pub completion_threshold_ms: u64,

    /// Seek step for the forward/back controls
    pub seek_step_secs: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            checkpoint_every_ticks: 30,
            completion_threshold_ms: 1000,
            seek_step_secs: 30,
        }
    }
}

impl ConfigSection for PlayerConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(self.tick_interval_ms, 100, 10_000, "player.tick_interval_ms"),
            Validator::in_range(
                self.checkpoint_every_ticks,
                1,
                600,
                "player.checkpoint_every_ticks",
            ),
            Validator::in_range(
                self.completion_threshold_ms,
                0,
                10_000,
                "player.completion_threshold_ms",
            ),
            Validator::in_range(self.seek_step_secs, 1, 600, "player.seek_step_secs"),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.tick_interval_ms = other.tick_interval_ms;
        self.checkpoint_every_ticks = other.checkpoint_every_ticks;
        self.completion_threshold_ms = other.completion_threshold_ms;
        self.seek_step_secs = other.seek_step_secs;
    }

    fn section_name(&self) -> &'static str {
        "player"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(PlayerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_tick_interval_too_fast() {
        let config = PlayerConfig {
            tick_interval_ms: 10,
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors[0].field, "player.tick_interval_ms");
    }

    #[test]
    fn test_zero_checkpoint_ticks_rejected() {
        let config = PlayerConfig {
            checkpoint_every_ticks: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_completion_threshold_allowed() {
        let config = PlayerConfig {
            completion_threshold_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge() {
        let mut base = PlayerConfig::default();
        let other = PlayerConfig {
            seek_step_secs: 10,
            ..Default::default()
        };
        base.merge(other);
        assert_eq!(base.seek_step_secs, 10);
    }
}
