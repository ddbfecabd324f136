pub mod mode;
pub mod context;
pub mod manager;

pub use mode::{Mode, ModeController, Transition};
pub use context::{CaptureOutcome, EngineContext};
pub use manager::{EngineStats, ReplayEngine};

use crate::playback::LoopState;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Engine error taxonomy
///
/// Both variants are internal guards: the command surface refuses silently
/// instead of propagating them, so a button press can never break the tool.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// Replay was requested with zero captured frames
    #[error("frame buffer is empty")]
    EmptyBuffer,

    /// Cursor index computed outside the playback sequence
    #[error("cursor index {index} out of range (sequence length {len})")]
    OutOfRange { index: usize, len: usize },
}

/// Discrete operator commands into the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Switch between recording and replaying
    ToggleMode,
    /// Pause or resume replay delivery
    TogglePause,
    /// Advance to the next speed multiplier, wrapping
    CycleSpeed,
    /// Scrub to a fractional position in [0, 1]
    SeekToFraction(f64),
    /// Mark/complete/clear the A/B loop region
    ToggleLoopPoint,
    /// Step one frame forward and pause
    StepForward,
    /// Step one frame back and pause
    StepBack,
}

/// Engine configuration, fixed at construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capture frame rate in frames per second
    pub capture_fps: u32,
    /// Buffer depth in seconds of capture
    pub buffer_secs: u32,
    /// Floor on the inter-frame delivery delay
    pub min_frame_interval: Duration,
    /// Ordered speed multiplier set cycled by `Command::CycleSpeed`
    pub speed_steps: Vec<f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capture_fps: 60,
            buffer_secs: 5,
            min_frame_interval: Duration::from_millis(16),
            speed_steps: vec![0.1, 0.25, 0.5, 1.0, 2.0],
        }
    }
}

impl EngineConfig {
    /// Frame capacity of the capture buffer
    pub fn buffer_capacity(&self) -> usize {
        self.capture_fps as usize * self.buffer_secs as usize
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), String> {
        if self.capture_fps == 0 {
            return Err("capture_fps must be positive".to_string());
        }
        if self.buffer_secs == 0 {
            return Err("buffer_secs must be positive".to_string());
        }
        if self.min_frame_interval.is_zero() {
            return Err("min_frame_interval must be positive".to_string());
        }
        if self.speed_steps.is_empty() {
            return Err("speed_steps must not be empty".to_string());
        }
        if self.speed_steps.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err("speed_steps must all be positive".to_string());
        }
        Ok(())
    }
}

/// Snapshot of engine state for display layers
#[derive(Debug, Clone)]
pub struct EngineStatus {
    /// Current mode
    pub mode: Mode,
    /// Whether replay is paused
    pub paused: bool,
    /// Current speed multiplier
    pub speed: f64,
    /// Replay position as a fraction of the sequence
    pub progress: f64,
    /// A/B loop region state
    pub loop_state: LoopState,
    /// Frames currently held by the capture buffer
    pub buffered: usize,
    /// Capture buffer capacity
    pub capacity: usize,
    /// Length of the active playback sequence (0 while recording)
    pub sequence_len: usize,
    /// Compact human-readable status line
    pub status_text: String,
}

impl Default for EngineStatus {
    fn default() -> Self {
        Self {
            mode: Mode::Recording,
            paused: false,
            speed: 1.0,
            progress: 0.0,
            loop_state: LoopState::Inactive,
            buffered: 0,
            capacity: 0,
            sequence_len: 0,
            status_text: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_capacity() {
        let config = EngineConfig::default();
        assert_eq!(config.buffer_capacity(), 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_zero_fps() {
        let config = EngineConfig {
            capture_fps: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_empty_speed_steps() {
        let config = EngineConfig {
            speed_steps: Vec::new(),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_nonpositive_speed() {
        let config = EngineConfig {
            speed_steps: vec![1.0, 0.0],
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
