pub mod frame;
pub mod buffer;

pub use frame::Frame;
pub use buffer::{FrameBuffer, PlaybackSequence};
