use crate::core::{Frame, FrameBuffer};
use crate::engine::mode::{Mode, ModeController, Transition};
use crate::engine::{Command, EngineConfig, EngineStatus};
use crate::playback::{LoopState, PlaybackCursor, PlaybackScheduler};
use tokio::time::Instant;
use tracing::{debug, trace};

/// What happened to a frame arriving from the capture source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Frame entered the buffer; `evicted` is set when the oldest was dropped
    Stored { evicted: bool },
    /// Frame arrived outside Recording mode and was ignored
    Ignored,
}

/// Engine-wide mutable state with a single logical writer
///
/// Packages the buffer, mode machine, cursor and scheduler into one context
/// owned by the event loop that drives it. Every method is an atomic,
/// non-preemptible step; the context never blocks or yields mid-mutation,
/// which is what makes the lock-free single-writer model of the engine task
/// sound.
pub struct EngineContext {
    config: EngineConfig,
    buffer: FrameBuffer,
    modes: ModeController,
    cursor: Option<PlaybackCursor>,
    scheduler: PlaybackScheduler,
    speed_idx: usize,
}

impl EngineContext {
    /// Create a context with an empty buffer in Recording mode
    pub fn new(config: EngineConfig) -> Self {
        let buffer = FrameBuffer::new(config.buffer_capacity());
        let scheduler = PlaybackScheduler::new(config.capture_fps, config.min_frame_interval);
        // Start at 1x when the step set has it, else at the first step
        let speed_idx = config
            .speed_steps
            .iter()
            .position(|s| *s == 1.0)
            .unwrap_or(0);
        Self {
            config,
            buffer,
            modes: ModeController::new(),
            cursor: None,
            scheduler,
            speed_idx,
        }
    }

    /// Current mode
    pub fn mode(&self) -> Mode {
        self.modes.mode()
    }

    /// Armed delivery deadline, if replay is running
    pub fn deadline(&self) -> Option<Instant> {
        self.scheduler.deadline()
    }

    /// Current speed multiplier
    pub fn speed(&self) -> f64 {
        self.config.speed_steps[self.speed_idx]
    }

    /// Accept a frame from the capture source
    ///
    /// Frames arriving while replaying are ignored by this guard rather
    /// than by unregistering the source; capture keeps running outside.
    pub fn on_frame(&mut self, frame: Frame) -> CaptureOutcome {
        match self.modes.mode() {
            Mode::Recording => {
                let evicted = self.buffer.push(frame);
                CaptureOutcome::Stored { evicted }
            }
            Mode::Replaying => {
                trace!("ignoring captured frame while replaying");
                CaptureOutcome::Ignored
            }
        }
    }

    /// Handle one operator command
    ///
    /// Returns a frame when the command calls for an immediate delivery
    /// (replay start, resume, rate change, paused scrub preview, step).
    /// Commands with unmet preconditions are no-ops, never errors.
    pub fn handle(&mut self, command: Command) -> Option<Frame> {
        match command {
            Command::ToggleMode => self.toggle_mode(),
            Command::TogglePause => self.toggle_pause(),
            Command::CycleSpeed => self.cycle_speed(),
            Command::SeekToFraction(f) => self.seek(f),
            Command::ToggleLoopPoint => {
                if let Some(cursor) = self.cursor.as_mut() {
                    cursor.toggle_loop_point();
                    debug!("loop state now {:?}", cursor.loop_state());
                }
                None
            }
            Command::StepForward => self.step(|c| c.step_forward()),
            Command::StepBack => self.step(|c| c.step_back()),
        }
    }

    fn toggle_mode(&mut self) -> Option<Frame> {
        match self.modes.toggle(&self.buffer) {
            Some(Transition::EnterReplay(sequence)) => {
                let speed = self.speed();
                self.cursor = Some(PlaybackCursor::new(sequence, speed));
                // First delivery happens now; the scheduler takes over from here
                self.tick()
            }
            Some(Transition::EnterRecord) => {
                // Cancel before the transition returns so a stale wake can
                // never run against a replaced cursor
                self.scheduler.cancel();
                self.cursor = None;
                None
            }
            None => None,
        }
    }

    fn toggle_pause(&mut self) -> Option<Frame> {
        if !self.modes.is_replaying() {
            return None;
        }
        let cursor = self.cursor.as_mut()?;
        if cursor.is_paused() {
            cursor.set_paused(false);
            // Resume delivers without waiting out a full delay
            self.tick()
        } else {
            cursor.set_paused(true);
            self.scheduler.cancel();
            None
        }
    }

    fn cycle_speed(&mut self) -> Option<Frame> {
        self.speed_idx = (self.speed_idx + 1) % self.config.speed_steps.len();
        let speed = self.speed();
        debug!("speed now {}x", speed);

        let Some(cursor) = self.cursor.as_mut() else {
            return None;
        };
        cursor.set_speed(speed);

        if !self.modes.is_replaying() {
            return None;
        }
        if self.cursor.as_ref().is_some_and(|c| c.is_paused()) {
            // Preserved quirk: a rate change while paused single-steps the
            // replay and stays paused
            self.scheduler.cancel();
            self.step_delivery()
        } else {
            // Apply the new rate now instead of waiting out the stale delay
            self.scheduler.cancel();
            self.tick()
        }
    }

    fn seek(&mut self, fraction: f64) -> Option<Frame> {
        let cursor = self.cursor.as_mut()?;
        cursor.seek_to_fraction(fraction);
        if cursor.is_paused() {
            // Preview the scrubbed-to frame; position is unchanged by this
            return cursor.current_frame().ok().cloned();
        }
        // Running replay picks the new position up at the pending tick
        None
    }

    fn step(&mut self, op: impl FnOnce(&mut PlaybackCursor)) -> Option<Frame> {
        if !self.modes.is_replaying() {
            return None;
        }
        let cursor = self.cursor.as_mut()?;
        op(cursor);
        // Stepping force-pauses, so the pending delivery is cancelled
        self.scheduler.cancel();
        cursor.current_frame().ok().cloned()
    }

    /// Deliver the current frame and advance, leaving pause state alone
    fn step_delivery(&mut self) -> Option<Frame> {
        let cursor = self.cursor.as_mut()?;
        let frame = cursor.current_frame().ok()?.clone();
        cursor.advance();
        Some(frame)
    }

    /// One scheduler tick: deliver, advance, re-arm
    ///
    /// Re-checks every guard so a wake that raced a mode switch or pause
    /// degrades to a cancelled no-op.
    pub fn tick(&mut self) -> Option<Frame> {
        if !self.modes.is_replaying() {
            self.scheduler.cancel();
            return None;
        }
        let Some(cursor) = self.cursor.as_mut() else {
            self.scheduler.cancel();
            return None;
        };
        if cursor.is_paused() {
            self.scheduler.cancel();
            return None;
        }

        let frame = match cursor.current_frame() {
            Ok(frame) => frame.clone(),
            Err(_) => {
                self.scheduler.cancel();
                return None;
            }
        };
        cursor.advance();
        let speed = cursor.speed();
        self.scheduler.arm(speed);
        Some(frame)
    }

    /// Snapshot of the externally visible state
    pub fn status(&self) -> EngineStatus {
        let (paused, progress, loop_state, sequence_len) = match self.cursor.as_ref() {
            Some(c) => (c.is_paused(), c.progress(), c.loop_state(), c.len()),
            None => (false, 0.0, LoopState::Inactive, 0),
        };
        let mode = self.modes.mode();
        let speed = self.speed();
        let status_text = self.status_text(mode, paused, speed, progress, loop_state);
        EngineStatus {
            mode,
            paused,
            speed,
            progress,
            loop_state,
            buffered: self.buffer.len(),
            capacity: self.buffer.capacity(),
            sequence_len,
            status_text,
        }
    }

    fn status_text(
        &self,
        mode: Mode,
        paused: bool,
        speed: f64,
        progress: f64,
        loop_state: LoopState,
    ) -> String {
        match mode {
            Mode::Recording => format!(
                "REC {}/{} @ {} fps",
                self.buffer.len(),
                self.buffer.capacity(),
                self.config.capture_fps
            ),
            Mode::Replaying => {
                let mut text = format!("REPLAY {:.2}x {:.0}%", speed, progress * 100.0);
                if let LoopState::Active { a, b } = loop_state {
                    text.push_str(&format!(" loop {}-{}", a, b));
                }
                if paused {
                    text.push_str(" paused");
                }
                text
            }
        }
    }
}
