pub mod checkpoints;
pub mod connectors;

pub use checkpoints::{CheckpointRegion, CheckpointTrack};
pub use connectors::{TrackFileConnector, TrackLayout, TrackMetadata};
