//! Playback-related domain models

use serde::{Deserialize, Serialize};
use std::fmt;

/// States of the playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// No chapter open
    Idle,
    /// Waiting for the decoder to open the current chapter
    Loading,
    Playing,
    Paused,
    /// The current chapter finished playing
    Completed,
    /// Decoder failure; only a fresh start or chapter change leaves this state
    Error,
}

impl SessionState {
    /// Transport controls (pause, resume, seek) act on an open decoder
    pub fn has_open_chapter(&self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// Point-in-time snapshot of the session, for display and tests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub state: SessionState,
    pub book: Option<String>,
    pub chapter_index: usize,
    pub chapter_count: usize,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub is_playing: bool,
}

impl PlaybackState {
    pub fn idle() -> Self {
        Self {
            state: SessionState::Idle,
            book: None,
            chapter_index: 0,
            chapter_count: 0,
            position_ms: 0,
            duration_ms: 0,
            is_playing: false,
        }
    }

    /// Progress through the current chapter as a percentage
    pub fn progress_percentage(&self) -> f32 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        (self.position_ms as f64 / self.duration_ms as f64 * 100.0) as f32
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::idle()
    }
}
