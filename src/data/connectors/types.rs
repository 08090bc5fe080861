use crate::data::checkpoints::CheckpointTrack;
use crate::types::{Point, Segment};
use serde::{Deserialize, Serialize};

/// Everything the simulation needs from a loaded track file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackLayout {
    pub walls: Vec<Segment>,
    pub finish_line: Segment,
    pub start_point: Point,
    pub checkpoints: CheckpointTrack,
}

/// Summary of a loaded track, for logging and front ends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub file_path: String,
    pub num_points: usize,
    pub num_walls: usize,
    pub num_checkpoints: usize,
    pub reference_length: f64,
}
