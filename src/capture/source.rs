use async_trait::async_trait;
use crate::core::Frame;
use std::error::Error;

/// Result type for capture source operations
pub type SourceResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Configuration for a capture source
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Capture rate in frames per second
    pub fps: u32,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            width: 320,
            height: 180,
        }
    }
}

/// Status of a capture source
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceStatus {
    /// Source is disconnected
    Disconnected,
    /// Source is connecting
    Connecting,
    /// Source is connected and producing frames
    Connected,
    /// Source has an error
    Error,
}

/// Trait for live frame source implementations
///
/// The engine never talks to a capture device directly; it consumes frames
/// through this seam at whatever cadence the source produces them. A source
/// must never require the consumer to block between frames.
#[async_trait]
pub trait FrameSource: Send {
    /// Get the name/identifier of this source
    fn name(&self) -> &str;

    /// Get the current status of the source
    fn status(&self) -> SourceStatus;

    /// Connect to the source with the given configuration
    async fn connect(&mut self, config: SourceConfig) -> SourceResult<()>;

    /// Disconnect from the source
    async fn disconnect(&mut self) -> SourceResult<()>;

    /// Produce the next frame (returns None if no frame is ready)
    async fn next_frame(&mut self) -> SourceResult<Option<Frame>>;
}
