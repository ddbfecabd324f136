use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// A single captured video frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// Monotonic capture sequence number
    pub seq: u64,

    /// Capture timestamp in UTC
    pub captured_at: DateTime<Utc>,

    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Raw pixel bytes (opaque to the engine)
    pub data: Vec<u8>,
}

impl Frame {
    /// Create a new frame stamped with the current time
    pub fn new(seq: u64, width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            seq,
            captured_at: Utc::now(),
            width,
            height,
            data,
        }
    }

    /// Generate a deterministic synthetic frame for testing and demo sources
    ///
    /// The pixel pattern is derived from the sequence number so two frames
    /// with different seq values are distinguishable byte-wise.
    pub fn synthetic(seq: u64, width: u32, height: u32) -> Self {
        let len = (width * height) as usize;
        let mut data = Vec::with_capacity(len);
        for i in 0..len {
            data.push(((seq as usize + i) & 0xFF) as u8);
        }
        Self::new(seq, width, height, data)
    }

    /// Number of pixel bytes in this frame
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}
