use crate::core::Frame;
use tokio::sync::mpsc;
use tracing::debug;

/// Receiver of frames selected for display
///
/// `present` is called from the engine loop at up to the capture rate times
/// the fastest speed multiplier, so implementations must not block: drop
/// frames under backpressure rather than stall replay timing.
pub trait DisplaySink: Send {
    /// Hand one frame to the display
    fn present(&mut self, frame: &Frame);
}

/// Sink that forwards frames over a bounded channel
///
/// Frames that do not fit are dropped, never awaited.
pub struct ChannelSink {
    tx: mpsc::Sender<Frame>,
    dropped: u64,
}

impl ChannelSink {
    /// Create a sink and the receiving end for the display side
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx, dropped: 0 }, rx)
    }

    /// Frames dropped because the channel was full or closed
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl DisplaySink for ChannelSink {
    fn present(&mut self, frame: &Frame) {
        if self.tx.try_send(frame.clone()).is_err() {
            self.dropped += 1;
            debug!("display channel full, dropped frame {}", frame.seq);
        }
    }
}

/// Sink that discards every frame
pub struct NullSink;

impl DisplaySink for NullSink {
    fn present(&mut self, _frame: &Frame) {}
}

/// Sink that records delivered sequence numbers (for verification)
pub struct CollectingSink {
    seqs: std::sync::Arc<std::sync::Mutex<Vec<u64>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self {
            seqs: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    /// Shared handle to the delivered sequence numbers
    pub fn seqs(&self) -> std::sync::Arc<std::sync::Mutex<Vec<u64>>> {
        self.seqs.clone()
    }
}

impl Default for CollectingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink for CollectingSink {
    fn present(&mut self, frame: &Frame) {
        self.seqs.lock().expect("sink poisoned").push(frame.seq);
    }
}
