pub mod sink;

pub use sink::{ChannelSink, CollectingSink, DisplaySink, NullSink};
