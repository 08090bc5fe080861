use super::{
    types::{TrackLayout, TrackMetadata},
    validator::{TrackValidator, FINISH_LINE_POINTS, POINTS_PER_GROUP},
};
use crate::data::checkpoints::{CheckpointRegion, CheckpointTrack};
use crate::error::{EvoRacerError, Result};
use crate::types::{Point, Segment, Vec2};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

/// Reads track files: headerless `x,y` CSV, lines starting with `#` are
/// comments.
///
/// Points come in groups of four (left wall start, left wall end, right wall
/// start, right wall end), each group bounding one checkpoint region. The last
/// two points are the finish line.
pub struct TrackFileConnector;

impl TrackFileConnector {
    /// Load and validate a track file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<TrackLayout> {
        let df = Self::read_options()
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))
            .and_then(|reader| reader.finish())
            .map_err(|e| {
                EvoRacerError::TrackLoading(format!(
                    "Failed to read track {}: {}",
                    path.as_ref().display(),
                    e
                ))
            })?;

        let layout = Self::layout_from_frame(&df)?;
        log::info!(
            "Loaded track {} with {} checkpoints and {} walls",
            path.as_ref().display(),
            layout.checkpoints.len(),
            layout.walls.len()
        );
        Ok(layout)
    }

    /// Parse track file contents already in memory
    pub fn parse(contents: &str) -> Result<TrackLayout> {
        let df = Self::read_options()
            .into_reader_with_file_handle(Cursor::new(contents.as_bytes().to_vec()))
            .finish()
            .map_err(|e| EvoRacerError::TrackLoading(format!("Failed to parse track: {}", e)))?;

        Self::layout_from_frame(&df)
    }

    fn read_options() -> CsvReadOptions {
        let schema = Schema::from_iter([
            Field::new("x".into(), DataType::Float64),
            Field::new("y".into(), DataType::Float64),
        ]);

        CsvReadOptions::default()
            .with_has_header(false)
            .with_schema(Some(Arc::new(schema)))
            .with_parse_options(CsvParseOptions::default().with_comment_prefix(Some("#")))
    }

    fn layout_from_frame(df: &DataFrame) -> Result<TrackLayout> {
        let points = Self::points_from_frame(df)?;
        TrackValidator::validate_points(&points)?;
        Ok(Self::build_layout(&points))
    }

    /// Map the `x` and `y` columns to points. Missing values are an error.
    pub fn points_from_frame(df: &DataFrame) -> Result<Vec<Point>> {
        let xs = df.column("x")?.cast(&DataType::Float64)?;
        let ys = df.column("y")?.cast(&DataType::Float64)?;

        xs.f64()?
            .into_iter()
            .zip(ys.f64()?.into_iter())
            .enumerate()
            .map(|(row, coords)| match coords {
                (Some(x), Some(y)) => Ok(Vec2::new(x, y)),
                _ => Err(EvoRacerError::TrackLoading(format!(
                    "Point {}: expected `x,y`",
                    row + 1
                ))),
            })
            .collect()
    }

    fn build_layout(points: &[Point]) -> TrackLayout {
        let (wall_points, finish) = points.split_at(points.len() - FINISH_LINE_POINTS);

        let mut walls = Vec::new();
        let mut regions = Vec::new();
        for group in wall_points.chunks_exact(POINTS_PER_GROUP) {
            let (left_start, left_end, right_start, right_end) =
                (group[0], group[1], group[2], group[3]);

            walls.push(Segment::new(left_start, left_end));
            walls.push(Segment::new(right_start, right_end));
            regions.push(CheckpointRegion::new(vec![
                left_start,
                right_start,
                right_end,
                left_end,
            ]));
        }

        // Close the entry so cars cannot leave backwards
        walls.push(Segment::new(wall_points[0], wall_points[2]));

        let start_point = regions[0].centroid();
        TrackLayout {
            walls,
            finish_line: Segment::new(finish[0], finish[1]),
            start_point,
            checkpoints: CheckpointTrack::new(regions),
        }
    }

    pub fn create_metadata<P: AsRef<Path>>(path: P, layout: &TrackLayout) -> TrackMetadata {
        TrackMetadata {
            file_path: path.as_ref().display().to_string(),
            num_points: layout.checkpoints.len() * POINTS_PER_GROUP + FINISH_LINE_POINTS,
            num_walls: layout.walls.len(),
            num_checkpoints: layout.checkpoints.len(),
            reference_length: layout.checkpoints.reference_length(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORRIDOR: &str = "\
# two checkpoints
0,0
100,0
0,100
100,100
# second group
100,0
200,0
100,100
200,100
# finish
200,0
200,100
";

    #[test]
    fn test_parse_layout() {
        let layout = TrackFileConnector::parse(CORRIDOR).unwrap();

        assert_eq!(layout.checkpoints.len(), 2);
        // Two walls per group plus the entry wall
        assert_eq!(layout.walls.len(), 5);
        assert_eq!(layout.finish_line, Segment::new(Vec2::new(200.0, 0.0), Vec2::new(200.0, 100.0)));
        assert_eq!(layout.start_point, Vec2::new(50.0, 50.0));
        assert_eq!(layout.checkpoints.locate(layout.start_point), Some(0));
    }

    #[test]
    fn test_region_exit_edge_is_group_end() {
        let layout = TrackFileConnector::parse(CORRIDOR).unwrap();
        let region = layout.checkpoints.region(0).unwrap();
        assert_eq!(
            region.exit_edge(),
            Some((Vec2::new(100.0, 100.0), Vec2::new(100.0, 0.0)))
        );
    }

    #[test]
    fn test_rejects_malformed_line() {
        let result = TrackFileConnector::parse("0,0\n1;1\n");
        assert!(matches!(result, Err(EvoRacerError::TrackLoading(_))));
    }

    #[test]
    fn test_rejects_missing_coordinate() {
        let result = TrackFileConnector::parse("0,0\n1\n");
        assert!(matches!(result, Err(EvoRacerError::TrackLoading(_))));
    }

    #[test]
    fn test_load_reads_file() {
        let dir = std::env::temp_dir().join("evoracer_track_file_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("corridor.txt");
        std::fs::write(&path, CORRIDOR).unwrap();

        let layout = TrackFileConnector::load(&path).unwrap();
        assert_eq!(layout.checkpoints.len(), 2);

        let missing = TrackFileConnector::load(dir.join("missing.txt"));
        assert!(matches!(missing, Err(EvoRacerError::TrackLoading(_))));
    }

    #[test]
    fn test_rejects_wrong_point_count() {
        let result = TrackFileConnector::parse("0,0\n1,1\n2,2\n");
        assert!(result.is_err());
    }
}
