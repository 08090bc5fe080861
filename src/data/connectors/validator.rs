use crate::error::{EvoRacerError, Result};
use crate::types::Point;

/// Points per checkpoint group: left wall start/end, right wall start/end
pub const POINTS_PER_GROUP: usize = 4;

/// Trailing points that describe the finish line
pub const FINISH_LINE_POINTS: usize = 2;

pub struct TrackValidator;

impl TrackValidator {
    /// Validate the raw point list of a track file
    pub fn validate_points(points: &[Point]) -> Result<()> {
        if points.len() < POINTS_PER_GROUP + FINISH_LINE_POINTS {
            return Err(EvoRacerError::TrackLoading(format!(
                "Insufficient points: {}, minimum {} required",
                points.len(),
                POINTS_PER_GROUP + FINISH_LINE_POINTS
            )));
        }

        if (points.len() - FINISH_LINE_POINTS) % POINTS_PER_GROUP != 0 {
            return Err(EvoRacerError::TrackLoading(format!(
                "Point count {} is not four per checkpoint plus a two-point finish line",
                points.len()
            )));
        }

        if let Some((i, p)) = points.iter().enumerate().find(|(_, p)| !p.is_finite()) {
            return Err(EvoRacerError::TrackLoading(format!(
                "Non-finite coordinate at point {}: ({}, {})",
                i, p.x, p.y
            )));
        }

        let finish = &points[points.len() - FINISH_LINE_POINTS..];
        if finish[0] == finish[1] {
            return Err(EvoRacerError::TrackLoading(
                "Finish line has zero length".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vec2;

    fn points(n: usize) -> Vec<Point> {
        (0..n).map(|i| Vec2::new(i as f64, (i * 2) as f64)).collect()
    }

    #[test]
    fn test_accepts_groups_plus_finish_line() {
        assert!(TrackValidator::validate_points(&points(6)).is_ok());
        assert!(TrackValidator::validate_points(&points(10)).is_ok());
    }

    #[test]
    fn test_rejects_bad_counts() {
        assert!(TrackValidator::validate_points(&points(4)).is_err());
        assert!(TrackValidator::validate_points(&points(7)).is_err());
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut pts = points(6);
        pts[3] = Vec2::new(f64::NAN, 0.0);
        assert!(TrackValidator::validate_points(&pts).is_err());
    }
}
