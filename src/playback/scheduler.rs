use std::time::Duration;
use tokio::time::Instant;

/// Timed re-arm state for replay delivery
///
/// The only component that touches wall-clock time. Holds the single
/// outstanding delivery deadline for a replay session; the engine loop
/// sleeps until it and disarming it is how a pending tick gets cancelled.
pub struct PlaybackScheduler {
    base_interval: Duration,
    min_interval: Duration,
    deadline: Option<Instant>,
}

impl PlaybackScheduler {
    /// Create a scheduler for the given capture rate and interval floor
    pub fn new(capture_fps: u32, min_interval: Duration) -> Self {
        let fps = capture_fps.max(1);
        Self {
            base_interval: Duration::from_millis(1000 / fps as u64),
            min_interval,
            deadline: None,
        }
    }

    /// Inter-frame delay for a speed multiplier
    ///
    /// Faster playback shortens the delay, floored at `min_interval` so an
    /// extreme multiplier cannot degenerate into sub-frame rescheduling.
    pub fn delay_for(&self, speed: f64) -> Duration {
        let speed = if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            1.0
        };
        self.base_interval.div_f64(speed).max(self.min_interval)
    }

    /// Arm the single-shot deadline for the next tick
    pub fn arm(&mut self, speed: f64) -> Instant {
        let deadline = Instant::now() + self.delay_for(speed);
        self.deadline = Some(deadline);
        deadline
    }

    /// Cancel the pending deadline, if any
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Pending deadline, if armed
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether a tick is currently scheduled
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Base inter-frame interval at 1x speed
    pub fn base_interval(&self) -> Duration {
        self.base_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_at_unit_speed() {
        let s = PlaybackScheduler::new(60, Duration::from_millis(16));
        assert_eq!(s.delay_for(1.0), Duration::from_millis(16));

        let s = PlaybackScheduler::new(30, Duration::from_millis(16));
        assert_eq!(s.delay_for(1.0), Duration::from_millis(33));
    }

    #[test]
    fn test_delay_monotonic_in_speed() {
        let s = PlaybackScheduler::new(30, Duration::from_millis(16));
        let speeds = [0.1, 0.25, 0.5, 1.0, 2.0];
        for pair in speeds.windows(2) {
            let slow = s.delay_for(pair[0]);
            let fast = s.delay_for(pair[1]);
            assert!(slow >= fast, "{:?} < {:?}", slow, fast);
            assert!(fast >= Duration::from_millis(16));
        }
    }

    #[test]
    fn test_delay_floored_at_min_interval() {
        let s = PlaybackScheduler::new(60, Duration::from_millis(16));
        assert_eq!(s.delay_for(10.0), Duration::from_millis(16));
    }

    #[test]
    fn test_slow_speed_stretches_delay() {
        let s = PlaybackScheduler::new(60, Duration::from_millis(16));
        assert_eq!(s.delay_for(0.1), Duration::from_millis(160));
    }

    #[test]
    fn test_bad_speed_falls_back_to_base() {
        let s = PlaybackScheduler::new(60, Duration::from_millis(16));
        assert_eq!(s.delay_for(0.0), s.base_interval());
        assert_eq!(s.delay_for(f64::NAN), s.base_interval());
    }

    #[test]
    fn test_arm_and_cancel() {
        let s = &mut PlaybackScheduler::new(60, Duration::from_millis(16));
        assert!(!s.is_armed());
        s.arm(1.0);
        assert!(s.is_armed());
        s.cancel();
        assert!(!s.is_armed());
        assert!(s.deadline().is_none());
    }
}
