use crate::core::{FrameBuffer, PlaybackSequence};
use tracing::{debug, info};

/// Engine mode: exactly one is active at any time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Capturing frames into the buffer
    Recording,
    /// Replaying a snapshot of the buffer
    Replaying,
}

/// Side effects the engine must apply after a successful toggle
pub enum Transition {
    /// Replay begins over this snapshot
    EnterReplay(PlaybackSequence),
    /// Recording resumes; replay state must be torn down
    EnterRecord,
}

/// The record/replay state machine
///
/// Owns the transition rules: replay can only start over a non-empty
/// buffer, and a refused toggle leaves everything untouched.
pub struct ModeController {
    mode: Mode,
}

impl ModeController {
    /// Create a controller in the initial Recording mode
    pub fn new() -> Self {
        Self {
            mode: Mode::Recording,
        }
    }

    /// Current mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether frames should currently be captured
    pub fn is_recording(&self) -> bool {
        self.mode == Mode::Recording
    }

    /// Whether a replay session is active
    pub fn is_replaying(&self) -> bool {
        self.mode == Mode::Replaying
    }

    /// Attempt to switch modes
    ///
    /// Toggling out of Recording snapshots the buffer; with nothing
    /// captured the toggle is a refused no-op and mode stays Recording.
    pub fn toggle(&mut self, buffer: &FrameBuffer) -> Option<Transition> {
        match self.mode {
            Mode::Recording => match buffer.snapshot() {
                Ok(sequence) => {
                    self.mode = Mode::Replaying;
                    info!("entering replay over {} frames", sequence.len());
                    Some(Transition::EnterReplay(sequence))
                }
                Err(_) => {
                    debug!("replay refused: buffer is empty");
                    None
                }
            },
            Mode::Replaying => {
                self.mode = Mode::Recording;
                info!("resuming recording");
                Some(Transition::EnterRecord)
            }
        }
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Frame;

    #[test]
    fn test_initial_mode_is_recording() {
        let modes = ModeController::new();
        assert_eq!(modes.mode(), Mode::Recording);
    }

    #[test]
    fn test_toggle_refused_on_empty_buffer() {
        let mut modes = ModeController::new();
        let buffer = FrameBuffer::new(4);
        assert!(modes.toggle(&buffer).is_none());
        assert_eq!(modes.mode(), Mode::Recording);
    }

    #[test]
    fn test_toggle_enters_replay_with_snapshot() {
        let mut modes = ModeController::new();
        let mut buffer = FrameBuffer::new(4);
        buffer.push(Frame::synthetic(1, 2, 2));
        buffer.push(Frame::synthetic(2, 2, 2));

        match modes.toggle(&buffer) {
            Some(Transition::EnterReplay(sequence)) => {
                assert_eq!(sequence.len(), 2);
            }
            _ => panic!("expected replay transition"),
        }
        assert_eq!(modes.mode(), Mode::Replaying);
    }

    #[test]
    fn test_toggle_back_to_recording() {
        let mut modes = ModeController::new();
        let mut buffer = FrameBuffer::new(4);
        buffer.push(Frame::synthetic(1, 2, 2));

        modes.toggle(&buffer);
        match modes.toggle(&buffer) {
            Some(Transition::EnterRecord) => {}
            _ => panic!("expected record transition"),
        }
        assert_eq!(modes.mode(), Mode::Recording);
    }

    #[test]
    fn test_buffer_untouched_by_refused_toggle() {
        let mut modes = ModeController::new();
        let buffer = FrameBuffer::new(4);
        modes.toggle(&buffer);
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.capacity(), 4);
    }
}
