pub mod cursor;
pub mod scheduler;

pub use cursor::PlaybackCursor;
pub use scheduler::PlaybackScheduler;

/// A/B loop region state
///
/// The two-press loop command walks a three-step cycle: no loop, point A
/// marked, both points active. Kept as an explicit tagged state so every
/// transition is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// No loop region
    Inactive,
    /// First point marked, waiting for the second
    PointSet { a: usize },
    /// Loop region active, playback confined to [a, b]
    Active { a: usize, b: usize },
}

impl LoopState {
    /// Whether a full loop region is in effect
    pub fn is_active(&self) -> bool {
        matches!(self, LoopState::Active { .. })
    }
}
