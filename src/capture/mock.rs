use async_trait::async_trait;
use crate::capture::source::{FrameSource, SourceConfig, SourceResult, SourceStatus};
use crate::core::Frame;
use std::collections::VecDeque;
use std::time::Duration;

/// Mock frame source for testing and demos without a capture device
///
/// Generates synthetic frames paced at the configured rate, or plays back
/// frames injected by a test.
pub struct MockFrameSource {
    name: String,
    status: SourceStatus,
    config: Option<SourceConfig>,
    pending: VecDeque<Frame>,
    next_seq: u64,
    auto_generate: bool,
}

impl MockFrameSource {
    /// Create a new mock source
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: SourceStatus::Disconnected,
            config: None,
            pending: VecDeque::new(),
            next_seq: 0,
            auto_generate: false,
        }
    }

    /// Enable automatic frame generation at the configured cadence
    pub fn set_auto_generate(&mut self, enabled: bool) {
        self.auto_generate = enabled;
    }

    /// Queue a frame for delivery (for testing)
    pub fn inject_frame(&mut self, frame: Frame) {
        self.pending.push_back(frame);
    }

    /// Queue multiple frames for delivery
    pub fn inject_frames(&mut self, frames: Vec<Frame>) {
        for frame in frames {
            self.pending.push_back(frame);
        }
    }

    fn frame_interval(&self) -> Duration {
        let fps = self.config.as_ref().map(|c| c.fps).unwrap_or(60).max(1);
        Duration::from_millis(1000 / fps as u64)
    }

    fn generate_frame(&mut self) -> Frame {
        let (width, height) = self
            .config
            .as_ref()
            .map(|c| (c.width, c.height))
            .unwrap_or((320, 180));
        let frame = Frame::synthetic(self.next_seq, width, height);
        self.next_seq += 1;
        frame
    }
}

#[async_trait]
impl FrameSource for MockFrameSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> SourceStatus {
        self.status
    }

    async fn connect(&mut self, config: SourceConfig) -> SourceResult<()> {
        self.config = Some(config);
        self.status = SourceStatus::Connected;
        self.next_seq = 0;
        Ok(())
    }

    async fn disconnect(&mut self) -> SourceResult<()> {
        self.status = SourceStatus::Disconnected;
        self.config = None;
        self.pending.clear();
        Ok(())
    }

    async fn next_frame(&mut self) -> SourceResult<Option<Frame>> {
        if self.status != SourceStatus::Connected {
            return Err("Not connected".into());
        }

        // Injected frames are delivered immediately, ahead of generation
        if let Some(frame) = self.pending.pop_front() {
            return Ok(Some(frame));
        }

        if self.auto_generate {
            tokio::time::sleep(self.frame_interval()).await;
            let frame = self.generate_frame();
            return Ok(Some(frame));
        }

        Ok(None)
    }
}
