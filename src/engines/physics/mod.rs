//! Physics collaborator interface.
//!
//! Contacts are reported as data from [`Physics::step`] and handled by the
//! population between steps, so no collision handler ever re-enters agent or
//! genome state.

pub mod point_mass;

pub use point_mass::PointMassWorld;

use crate::types::{Point, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactKind {
    Wall,
    FinishLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub body: BodyId,
    pub kind: ContactKind,
}

/// Contacts that began during one step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub contacts: Vec<Contact>,
}

pub trait Physics {
    /// Add a body at rest at `position`
    fn spawn(&mut self, position: Point) -> BodyId;

    /// Remove a body entirely
    fn remove(&mut self, body: BodyId);

    /// Stop simulating a body; its last position stays queryable
    fn deactivate(&mut self, body: BodyId);

    fn is_active(&self, body: BodyId) -> bool;

    fn position(&self, body: BodyId) -> Option<Point>;

    fn velocity(&self, body: BodyId) -> Option<Vec2>;

    /// Apply `force` at the body's position for the next step
    fn apply_force(&mut self, body: BodyId, force: Vec2);

    /// Advance all active bodies by `dt` seconds
    fn step(&mut self, dt: f64) -> StepResult;

    fn active_bodies(&self) -> usize;
}
