use crate::types::{Point, Vec2};
use rapier2d::math::Real;
use rapier2d::na::Point2;
use rapier2d::parry::utils::point_in_poly2d;
use serde::{Deserialize, Serialize};

/// One checkpoint area of the track.
///
/// Boundary points are stored in drawing order. For well-formed regions the
/// 3rd and 4th points span the exit edge shared with the next region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRegion {
    points: Vec<Point>,
}

impl CheckpointRegion {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Point-in-polygon test. Regions with fewer than three points contain
    /// nothing.
    pub fn contains(&self, position: Point) -> bool {
        if self.points.len() < 3 {
            return false;
        }

        let polygon: Vec<Point2<Real>> = self.points.iter().map(|p| to_point2(*p)).collect();
        point_in_poly2d(&to_point2(position), &polygon)
    }

    /// Perpendicular distance from `position` to the exit edge, `|AC x AB| / |AB|`.
    ///
    /// Degenerate regions (fewer than four points, or a zero-length exit edge)
    /// report 0.
    pub fn distance_to_exit(&self, position: Point) -> f64 {
        let Some((a, b)) = self.exit_edge() else {
            return 0.0;
        };

        let ab = Vec2::between(a, b);
        let ab_len = ab.length();
        if ab_len == 0.0 {
            return 0.0;
        }

        let ac = Vec2::between(a, position);
        ac.cross(&ab).abs() / ab_len
    }

    pub fn exit_edge(&self) -> Option<(Point, Point)> {
        if self.points.len() < 4 {
            return None;
        }
        Some((self.points[2], self.points[3]))
    }

    pub fn centroid(&self) -> Point {
        if self.points.is_empty() {
            return Vec2::ZERO;
        }
        let sum = self
            .points
            .iter()
            .fold(Vec2::ZERO, |acc, p| acc + *p);
        sum * (1.0 / self.points.len() as f64)
    }
}

fn to_point2(p: Point) -> Point2<Real> {
    Point2::new(p.x as Real, p.y as Real)
}

/// Ordered checkpoint regions from start (index 0) to finish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointTrack {
    regions: Vec<CheckpointRegion>,
    reference_length: f64,
}

impl CheckpointTrack {
    /// Builds the track, normalising exit distances against the larger side
    /// of the bounding box of all region points.
    pub fn new(regions: Vec<CheckpointRegion>) -> Self {
        let reference_length = Self::extent(&regions);
        Self {
            regions,
            reference_length,
        }
    }

    pub fn with_reference_length(mut self, reference_length: f64) -> Self {
        if reference_length > 0.0 {
            self.reference_length = reference_length;
        }
        self
    }

    pub fn regions(&self) -> &[CheckpointRegion] {
        &self.regions
    }

    pub fn region(&self, index: usize) -> Option<&CheckpointRegion> {
        self.regions.get(index)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn reference_length(&self) -> f64 {
        self.reference_length
    }

    /// Index of the region containing `position`. Overlaps resolve to the
    /// highest index; `None` means the position is off the checkpoint sequence.
    pub fn locate(&self, position: Point) -> Option<usize> {
        self.regions
            .iter()
            .rposition(|region| region.contains(position))
    }

    fn extent(regions: &[CheckpointRegion]) -> f64 {
        let mut points = regions.iter().flat_map(|r| r.points().iter());
        let Some(first) = points.next() else {
            return 1.0;
        };

        let (mut min, mut max) = (*first, *first);
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }

        let extent = (max.x - min.x).max(max.y - min.y);
        if extent > 0.0 {
            extent
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f64, x1: f64) -> CheckpointRegion {
        // Drawn as [p0, p2, p3, p1]: exit edge is the right-hand side
        CheckpointRegion::new(vec![
            Vec2::new(x0, 0.0),
            Vec2::new(x0, 100.0),
            Vec2::new(x1, 100.0),
            Vec2::new(x1, 0.0),
        ])
    }

    #[test]
    fn test_contains() {
        let region = rect(0.0, 100.0);
        assert!(region.contains(Vec2::new(50.0, 50.0)));
        assert!(!region.contains(Vec2::new(150.0, 50.0)));
        assert!(!region.contains(Vec2::new(50.0, -1.0)));
    }

    #[test]
    fn test_contains_concave_region() {
        // L-shape: the notch at the top right is outside
        let region = CheckpointRegion::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(100.0, 0.0),
            Vec2::new(100.0, 50.0),
            Vec2::new(50.0, 50.0),
            Vec2::new(50.0, 100.0),
            Vec2::new(0.0, 100.0),
        ]);
        assert!(region.contains(Vec2::new(25.0, 75.0)));
        assert!(region.contains(Vec2::new(75.0, 25.0)));
        assert!(!region.contains(Vec2::new(75.0, 75.0)));
        assert!(!CheckpointRegion::new(vec![Vec2::ZERO, Vec2::new(1.0, 1.0)]).contains(Vec2::ZERO));
    }

    #[test]
    fn test_distance_to_exit() {
        let region = rect(0.0, 100.0);
        assert!((region.distance_to_exit(Vec2::new(30.0, 50.0)) - 70.0).abs() < 1e-9);
        assert!((region.distance_to_exit(Vec2::new(99.0, 10.0)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_region_distance_is_zero() {
        let triangle = CheckpointRegion::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 10.0),
            Vec2::new(10.0, 0.0),
        ]);
        assert_eq!(triangle.distance_to_exit(Vec2::new(1.0, 1.0)), 0.0);
        assert!(triangle.contains(Vec2::new(1.0, 1.0)));
    }

    #[test]
    fn test_locate_prefers_highest_overlapping_region() {
        let track = CheckpointTrack::new(vec![rect(0.0, 100.0), rect(50.0, 150.0)]);
        assert_eq!(track.locate(Vec2::new(25.0, 50.0)), Some(0));
        assert_eq!(track.locate(Vec2::new(75.0, 50.0)), Some(1));
        assert_eq!(track.locate(Vec2::new(500.0, 50.0)), None);
    }

    #[test]
    fn test_reference_length_is_larger_extent() {
        let track = CheckpointTrack::new(vec![rect(0.0, 100.0), rect(100.0, 300.0)]);
        assert_eq!(track.reference_length(), 300.0);
        assert_eq!(track.with_reference_length(1000.0).reference_length(), 1000.0);
    }
}
