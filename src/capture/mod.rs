pub mod source;
pub mod mock;

pub use source::{FrameSource, SourceConfig, SourceResult, SourceStatus};
pub use mock::MockFrameSource;
