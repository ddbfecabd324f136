use crate::core::Frame;
use crate::engine::EngineError;
use std::collections::VecDeque;

/// Bounded FIFO store of captured frames
///
/// Holds at most `capacity` frames; pushing into a full buffer evicts the
/// single oldest frame first. The buffer is only ever appended to by the
/// capture path and survives mode switches intact, so recording can resume
/// after a replay session without losing history.
pub struct FrameBuffer {
    frames: VecDeque<Frame>,
    capacity: usize,
}

impl FrameBuffer {
    /// Create an empty buffer holding at most `capacity` frames
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a frame, evicting the oldest if the buffer is full
    ///
    /// Always succeeds; overflow degrades by dropping history, never by
    /// blocking the capture source.
    pub fn push(&mut self, frame: Frame) -> bool {
        let evicted = self.frames.len() >= self.capacity;
        if evicted {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
        evicted
    }

    /// Take an independent oldest-first copy of the current contents
    ///
    /// Refuses on an empty buffer so a replay session can never start with
    /// nothing to show.
    pub fn snapshot(&self) -> Result<PlaybackSequence, EngineError> {
        if self.frames.is_empty() {
            return Err(EngineError::EmptyBuffer);
        }
        Ok(PlaybackSequence {
            frames: self.frames.iter().cloned().collect(),
        })
    }

    /// Number of frames currently buffered
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the buffer holds no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Maximum number of frames the buffer will hold
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Immutable snapshot of the frame buffer used for one replay session
///
/// Length is fixed for the lifetime of the session; later captures do not
/// show up here.
#[derive(Debug, Clone)]
pub struct PlaybackSequence {
    frames: Vec<Frame>,
}

impl PlaybackSequence {
    /// Number of frames in the sequence
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the sequence holds no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at `index`, if in range
    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Iterate frames oldest-first
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    #[cfg(test)]
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self { frames }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(seq: u64) -> Frame {
        Frame::synthetic(seq, 2, 2)
    }

    #[test]
    fn test_push_within_capacity() {
        let mut buf = FrameBuffer::new(5);
        for seq in 0..3 {
            assert!(!buf.push(frame(seq)));
        }
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_bounded_buffer_keeps_last_frames() {
        // N pushes into capacity C leaves min(N, C) frames, the last C in order
        let mut buf = FrameBuffer::new(3);
        for seq in 1..=7 {
            buf.push(frame(seq));
        }
        assert_eq!(buf.len(), 3);
        let snap = buf.snapshot().unwrap();
        let seqs: Vec<u64> = snap.iter().map(|f| f.seq).collect();
        assert_eq!(seqs, vec![5, 6, 7]);
    }

    #[test]
    fn test_push_reports_eviction() {
        let mut buf = FrameBuffer::new(2);
        assert!(!buf.push(frame(1)));
        assert!(!buf.push(frame(2)));
        assert!(buf.push(frame(3)));
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_snapshot_empty_refused() {
        let buf = FrameBuffer::new(4);
        assert!(matches!(buf.snapshot(), Err(EngineError::EmptyBuffer)));
    }

    #[test]
    fn test_snapshot_independent_of_later_pushes() {
        let mut buf = FrameBuffer::new(4);
        buf.push(frame(1));
        buf.push(frame(2));

        let snap = buf.snapshot().unwrap();
        assert_eq!(snap.len(), 2);

        buf.push(frame(3));
        buf.push(frame(4));
        buf.push(frame(5)); // evicts frame 1 from the live buffer

        assert_eq!(snap.len(), 2);
        let seqs: Vec<u64> = snap.iter().map(|f| f.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[test]
    fn test_buffer_retained_after_snapshot() {
        let mut buf = FrameBuffer::new(4);
        buf.push(frame(1));
        buf.push(frame(2));
        let _ = buf.snapshot().unwrap();
        assert_eq!(buf.len(), 2);
    }
}
