use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub};

/// Planar vector used for positions, velocities and forces
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

/// A position on the track
pub type Point = Vec2;

/// A single force applied to an agent for one simulation step.
///
/// Genes are plain values: once sampled they are never edited in place,
/// genomes only ever replace them wholesale.
pub type Gene = Vec2;

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector pointing from `from` to `to`
    pub fn between(from: Point, to: Point) -> Self {
        to - from
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Z component of the 3-D cross product of two planar vectors
    pub fn cross(&self, other: &Vec2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Rescale to at most `max` length, keeping direction
    pub fn limit(&self, max: f64) -> Vec2 {
        let len = self.length();
        if len > max && len > 0.0 {
            *self * (max / len)
        } else {
            *self
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Per-axis bound on gene components (asymmetric, e.g. 5000 x 3000)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceBounds {
    pub max_x: f64,
    pub max_y: f64,
}

impl ForceBounds {
    pub fn new(max_x: f64, max_y: f64) -> Self {
        Self { max_x, max_y }
    }

    /// Component-wise clamp into `[-max_x, max_x] x [-max_y, max_y]`
    pub fn clamp(&self, force: Vec2) -> Gene {
        Vec2::new(
            force.x.clamp(-self.max_x, self.max_x),
            force.y.clamp(-self.max_y, self.max_y),
        )
    }
}

impl Default for ForceBounds {
    fn default() -> Self {
        Self {
            max_x: 5000.0,
            max_y: 3000.0,
        }
    }
}

/// Straight line segment, used for walls and the finish line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_product_sign() {
        let a = Vec2::new(1.0, 0.0);
        let b = Vec2::new(0.0, 1.0);
        assert_eq!(a.cross(&b), 1.0);
        assert_eq!(b.cross(&a), -1.0);
    }

    #[test]
    fn test_force_bounds_are_asymmetric() {
        let bounds = ForceBounds::new(5000.0, 3000.0);
        let clamped = bounds.clamp(Vec2::new(-9000.0, 4000.0));
        assert_eq!(clamped, Vec2::new(-5000.0, 3000.0));
    }
}
