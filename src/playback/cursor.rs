use crate::core::{Frame, PlaybackSequence};
use crate::engine::EngineError;
use crate::playback::LoopState;

/// Replay position within a playback sequence
///
/// Decides which frame to show and where to go next, honoring the A/B loop
/// region. Wall-clock timing lives in the scheduler; the cursor is pure
/// index arithmetic and therefore deterministic for a given command stream.
pub struct PlaybackCursor {
    sequence: PlaybackSequence,
    index: usize,
    speed: f64,
    paused: bool,
    loop_state: LoopState,
}

impl PlaybackCursor {
    /// Create a cursor at the start of a sequence
    pub fn new(sequence: PlaybackSequence, speed: f64) -> Self {
        Self {
            sequence,
            index: 0,
            speed: clamp_speed(speed),
            paused: false,
            loop_state: LoopState::Inactive,
        }
    }

    /// Frame at the current position
    pub fn current_frame(&self) -> Result<&Frame, EngineError> {
        self.sequence.get(self.index).ok_or(EngineError::OutOfRange {
            index: self.index,
            len: self.sequence.len(),
        })
    }

    /// Move to the next position
    ///
    /// With an active loop the index is confined to [a, b] by wrap-around;
    /// without one the whole sequence wraps, so replay loops continuously
    /// by default.
    pub fn advance(&mut self) {
        let len = self.sequence.len();
        if len == 0 {
            return;
        }

        if let LoopState::Active { a, b } = self.loop_state {
            if self.index >= b {
                self.index = a;
            } else if self.index < a {
                self.index = a;
            } else {
                self.index += 1;
            }
        } else {
            self.index = (self.index + 1) % len;
        }
    }

    /// Jump to a fractional position along the sequence
    ///
    /// Idempotent and index-only; the caller decides whether to reschedule
    /// delivery. Out-of-range fractions are clamped, never rejected.
    pub fn seek_to_fraction(&mut self, fraction: f64) {
        let len = self.sequence.len();
        if len == 0 {
            return;
        }
        let f = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.index = ((f * len as f64).floor() as usize).min(len - 1);
    }

    /// Mark or clear a loop point, cycling none -> A -> A/B -> none
    ///
    /// Marking the second point behind the first snaps B to the end of the
    /// sequence, so the region is always non-empty and well-ordered no
    /// matter what order the operator pressed in.
    pub fn toggle_loop_point(&mut self) {
        let len = self.sequence.len();
        if len == 0 {
            return;
        }

        self.loop_state = match self.loop_state {
            LoopState::Inactive => LoopState::PointSet { a: self.index },
            LoopState::PointSet { a } => {
                let b = if a > self.index { len - 1 } else { self.index };
                LoopState::Active { a, b }
            }
            LoopState::Active { .. } => LoopState::Inactive,
        };
    }

    /// Clear any loop region without touching the index
    pub fn clear_loop(&mut self) {
        self.loop_state = LoopState::Inactive;
    }

    /// Step one frame forward and pause
    pub fn step_forward(&mut self) {
        let len = self.sequence.len();
        if len == 0 {
            return;
        }
        let next = (self.index + 1).min(len - 1);
        self.index = self.clamp_to_loop(next);
        self.paused = true;
    }

    /// Step one frame back and pause
    pub fn step_back(&mut self) {
        if self.sequence.is_empty() {
            return;
        }
        let prev = self.index.saturating_sub(1);
        self.index = self.clamp_to_loop(prev);
        self.paused = true;
    }

    fn clamp_to_loop(&self, index: usize) -> usize {
        match self.loop_state {
            LoopState::Active { a, b } => index.clamp(a, b),
            _ => index,
        }
    }

    /// Set the playback speed multiplier
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = clamp_speed(speed);
    }

    /// Current speed multiplier
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Set or clear the paused flag
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Whether playback is paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current index into the sequence
    pub fn index(&self) -> usize {
        self.index
    }

    /// Length of the playback sequence
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Whether the sequence is empty
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Current loop region state
    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    /// Position as a fraction of the sequence length
    pub fn progress(&self) -> f64 {
        let len = self.sequence.len();
        if len == 0 {
            0.0
        } else {
            self.index as f64 / len as f64
        }
    }
}

fn clamp_speed(speed: f64) -> f64 {
    speed.max(0.1).min(10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(len: u64) -> PlaybackCursor {
        let frames = (0..len).map(|seq| Frame::synthetic(seq, 2, 2)).collect();
        PlaybackCursor::new(PlaybackSequence::from_frames(frames), 1.0)
    }

    #[test]
    fn test_default_wrap_at_end() {
        let mut c = cursor(5);
        c.seek_to_fraction(0.99);
        assert_eq!(c.index(), 4);
        c.advance();
        assert_eq!(c.index(), 0);
    }

    #[test]
    fn test_advance_without_loop_increments() {
        let mut c = cursor(5);
        c.advance();
        c.advance();
        c.advance();
        assert_eq!(c.index(), 3);
    }

    #[test]
    fn test_seek_clamps_fraction() {
        let mut c = cursor(10);
        c.seek_to_fraction(2.5);
        assert_eq!(c.index(), 9);
        c.seek_to_fraction(-1.0);
        assert_eq!(c.index(), 0);
        c.seek_to_fraction(f64::NAN);
        assert_eq!(c.index(), 0);
    }

    #[test]
    fn test_seek_is_idempotent() {
        let mut c = cursor(10);
        c.seek_to_fraction(0.5);
        let first = c.index();
        c.seek_to_fraction(0.5);
        assert_eq!(c.index(), first);
        assert_eq!(first, 5);
    }

    #[test]
    fn test_loop_cycle_three_presses() {
        let mut c = cursor(6);
        c.seek_to_fraction(0.2);
        c.toggle_loop_point();
        assert_eq!(c.loop_state(), LoopState::PointSet { a: 1 });

        c.seek_to_fraction(0.5);
        c.toggle_loop_point();
        assert_eq!(c.loop_state(), LoopState::Active { a: 1, b: 3 });

        c.toggle_loop_point();
        assert_eq!(c.loop_state(), LoopState::Inactive);
    }

    #[test]
    fn test_loop_containment() {
        let mut c = cursor(6);
        c.seek_to_fraction(0.2); // index 1
        c.toggle_loop_point();
        c.seek_to_fraction(0.5); // index 3
        c.toggle_loop_point();

        // cycles 1,2,3,1,2,3,...
        let mut seen = Vec::new();
        for _ in 0..8 {
            c.advance();
            seen.push(c.index());
        }
        assert_eq!(seen, vec![1, 2, 3, 1, 2, 3, 1, 2]);
        assert!(seen.iter().all(|&i| (1..=3).contains(&i)));
    }

    #[test]
    fn test_loop_snap_rule_b_before_a() {
        let mut c = cursor(8);
        c.seek_to_fraction(0.6); // index 4
        c.toggle_loop_point();
        c.seek_to_fraction(0.1); // index 0, behind A
        c.toggle_loop_point();
        assert_eq!(c.loop_state(), LoopState::Active { a: 4, b: 7 });
    }

    #[test]
    fn test_advance_from_below_loop_region_enters_at_a() {
        let mut c = cursor(8);
        c.seek_to_fraction(0.5); // index 4
        c.toggle_loop_point();
        c.seek_to_fraction(0.75); // index 6
        c.toggle_loop_point();
        assert_eq!(c.loop_state(), LoopState::Active { a: 4, b: 6 });

        // A later seek can leave the region; the next advance re-enters at A
        c.seek_to_fraction(0.0);
        c.advance();
        assert_eq!(c.index(), 4);
    }

    #[test]
    fn test_step_forward_stops_at_end() {
        let mut c = cursor(3);
        c.seek_to_fraction(1.0);
        assert_eq!(c.index(), 2);
        c.step_forward();
        assert_eq!(c.index(), 2);
        assert!(c.is_paused());
    }

    #[test]
    fn test_step_back_stops_at_start() {
        let mut c = cursor(3);
        c.step_back();
        assert_eq!(c.index(), 0);
        assert!(c.is_paused());
    }

    #[test]
    fn test_step_respects_loop_region() {
        let mut c = cursor(8);
        c.seek_to_fraction(0.25); // index 2
        c.toggle_loop_point();
        c.seek_to_fraction(0.5); // index 4
        c.toggle_loop_point();

        c.seek_to_fraction(0.5);
        c.step_forward(); // 5 clamps into [2, 4]
        assert_eq!(c.index(), 4);

        c.seek_to_fraction(0.0);
        c.step_back();
        assert_eq!(c.index(), 2);
    }

    #[test]
    fn test_current_frame_in_range_everywhere() {
        // index can never leave [0, len) through any command sequence
        let mut c = cursor(4);
        for step in 0..40 {
            c.advance();
            if step % 3 == 0 {
                c.seek_to_fraction(step as f64 / 10.0);
            }
            if step % 7 == 0 {
                c.toggle_loop_point();
            }
            assert!(c.index() < c.len());
            assert!(c.current_frame().is_ok());
        }
    }

    #[test]
    fn test_out_of_range_only_on_empty_sequence() {
        let c = PlaybackCursor::new(PlaybackSequence::from_frames(Vec::new()), 1.0);
        assert!(matches!(
            c.current_frame(),
            Err(EngineError::OutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_speed_clamped() {
        let mut c = cursor(3);
        c.set_speed(0.0);
        assert_eq!(c.speed(), 0.1);
        c.set_speed(100.0);
        assert_eq!(c.speed(), 10.0);
        c.set_speed(2.0);
        assert_eq!(c.speed(), 2.0);
    }

    #[test]
    fn test_progress_fraction() {
        let mut c = cursor(4);
        assert_eq!(c.progress(), 0.0);
        c.advance();
        assert_eq!(c.progress(), 0.25);
    }
}
