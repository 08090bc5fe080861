use super::{BodyId, Contact, ContactKind, Physics, StepResult};
use crate::config::SimulationConfig;
use crate::data::connectors::TrackLayout;
use crate::types::{Point, Segment, Vec2};
use rapier2d::na::{Point2, Vector2};
use rapier2d::prelude::{
    ActiveCollisionTypes, ActiveEvents, BroadPhaseBvh, CCDSolver, ChannelEventCollector,
    ColliderBuilder, ColliderHandle, ColliderSet, CollisionEvent, ContactForceEvent,
    ImpulseJointSet, IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase,
    PhysicsPipeline, Real, RigidBodyBuilder, RigidBodyHandle, RigidBodySet, SharedShape,
};
use std::collections::{BTreeMap, HashMap};

/// Radius of the ball collider standing in for a car
pub const BODY_RADIUS: Real = 1.0;

struct Body {
    handle: RigidBodyHandle,
    collider: ColliderHandle,
    force: Vec2,
    active: bool,
}

/// Small frictionless balls steered by per-step forces between static wall
/// segments, simulated with rapier.
///
/// Velocity is advanced by `force / mass * dt` and capped at `max_speed`
/// before each rapier step, so no body moves more than `max_speed * dt` per
/// step. Walls are segment colliders hit with CCD; the finish line is a
/// capsule sensor half that displacement wide, so a crossing cannot skip it.
/// A body is reported once on its first contact and then disabled. Finish
/// takes precedence over walls. A body stopped by a wall is put back at its
/// position from before the step so it stays on the track side of the wall.
pub struct PointMassWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector2<Real>,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    rigid_bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    event_handler: ChannelEventCollector,
    collision_recv: std::sync::mpsc::Receiver<CollisionEvent>,
    // Force events are never requested; kept so the collector has a live channel
    _contact_force_recv: std::sync::mpsc::Receiver<ContactForceEvent>,
    track_handle: RigidBodyHandle,
    walls: Vec<Segment>,
    finish_line: Option<Segment>,
    finish_collider: Option<ColliderHandle>,
    bodies: BTreeMap<BodyId, Body>,
    body_colliders: HashMap<ColliderHandle, BodyId>,
    next_id: usize,
    mass: f64,
    max_speed: f64,
}

impl PointMassWorld {
    pub fn new(walls: Vec<Segment>, finish_line: Option<Segment>, mass: f64, max_speed: f64) -> Self {
        let (collision_send, collision_recv) = std::sync::mpsc::channel();
        let (contact_force_send, contact_force_recv) = std::sync::mpsc::channel();

        let mut rigid_bodies = RigidBodySet::new();
        let track_handle = rigid_bodies.insert(RigidBodyBuilder::fixed().build());

        let mut world = Self {
            pipeline: PhysicsPipeline::new(),
            gravity: Vector2::zeros(),
            integration_parameters: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_bodies,
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            event_handler: ChannelEventCollector::new(collision_send, contact_force_send),
            collision_recv,
            _contact_force_recv: contact_force_recv,
            track_handle,
            walls: Vec::new(),
            finish_line,
            finish_collider: None,
            bodies: BTreeMap::new(),
            body_colliders: HashMap::new(),
            next_id: 0,
            mass,
            max_speed,
        };

        for wall in walls {
            world.add_wall(wall);
        }
        world.set_finish_margin(BODY_RADIUS as f64);
        world
    }

    pub fn from_layout(layout: &TrackLayout, config: &SimulationConfig) -> Self {
        let mut world = Self::new(
            layout.walls.clone(),
            Some(layout.finish_line),
            config.body_mass,
            config.max_speed,
        );
        world.set_finish_margin(config.max_speed * config.time_step / 2.0);
        world
    }

    pub fn walls(&self) -> &[Segment] {
        &self.walls
    }

    /// Add a wall at runtime, e.g. one drawn by the user
    pub fn add_wall(&mut self, wall: Segment) {
        let collider = ColliderBuilder::segment(to_point(wall.start), to_point(wall.end))
            .friction(0.0)
            .build();
        self.colliders
            .insert_with_parent(collider, self.track_handle, &mut self.rigid_bodies);
        self.walls.push(wall);
    }

    /// Rebuild the finish sensor as a capsule of radius `margin` around the
    /// finish line. Never narrower than a body.
    pub fn set_finish_margin(&mut self, margin: f64) {
        let Some(line) = self.finish_line else {
            return;
        };

        if let Some(old) = self.finish_collider.take() {
            self.colliders.remove(
                old,
                &mut self.island_manager,
                &mut self.rigid_bodies,
                false,
            );
        }

        let radius = (margin as Real).max(BODY_RADIUS);
        let sensor = ColliderBuilder::new(SharedShape::capsule(
            to_point(line.start),
            to_point(line.end),
            radius,
        ))
        .sensor(true)
        .build();
        self.finish_collider = Some(self.colliders.insert_with_parent(
            sensor,
            self.track_handle,
            &mut self.rigid_bodies,
        ));
    }

    fn drain_contacts(&self) -> BTreeMap<BodyId, ContactKind> {
        let mut contacts = BTreeMap::new();

        while let Ok(event) = self.collision_recv.try_recv() {
            let CollisionEvent::Started(h1, h2, _) = event else {
                continue;
            };
            let (body, other) = match (self.body_colliders.get(&h1), self.body_colliders.get(&h2)) {
                (Some(body), _) => (*body, h2),
                (None, Some(body)) => (*body, h1),
                (None, None) => continue,
            };

            let kind = if Some(other) == self.finish_collider {
                ContactKind::FinishLine
            } else {
                ContactKind::Wall
            };
            contacts
                .entry(body)
                .and_modify(|current| {
                    if kind == ContactKind::FinishLine {
                        *current = kind;
                    }
                })
                .or_insert(kind);
        }

        contacts
    }
}

impl Physics for PointMassWorld {
    fn spawn(&mut self, position: Point) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;

        let rigid_body = RigidBodyBuilder::dynamic()
            .translation(to_vector(position))
            .additional_mass(self.mass as Real)
            .lock_rotations()
            .can_sleep(false)
            .ccd_enabled(true)
            .build();
        let handle = self.rigid_bodies.insert(rigid_body);

        let collider = ColliderBuilder::ball(BODY_RADIUS)
            .density(0.0)
            .friction(0.0)
            .active_collision_types(ActiveCollisionTypes::DYNAMIC_FIXED)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, handle, &mut self.rigid_bodies);

        self.body_colliders.insert(collider, id);
        self.bodies.insert(
            id,
            Body {
                handle,
                collider,
                force: Vec2::ZERO,
                active: true,
            },
        );
        id
    }

    fn remove(&mut self, body: BodyId) {
        let Some(removed) = self.bodies.remove(&body) else {
            return;
        };
        self.body_colliders.remove(&removed.collider);
        self.rigid_bodies.remove(
            removed.handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    fn deactivate(&mut self, body: BodyId) {
        let Some(b) = self.bodies.get_mut(&body) else {
            return;
        };
        b.active = false;
        b.force = Vec2::ZERO;
        if let Some(rigid_body) = self.rigid_bodies.get_mut(b.handle) {
            rigid_body.set_linvel(Vector2::zeros(), false);
            rigid_body.set_enabled(false);
        }
    }

    fn is_active(&self, body: BodyId) -> bool {
        self.bodies.get(&body).is_some_and(|b| b.active)
    }

    fn position(&self, body: BodyId) -> Option<Point> {
        let b = self.bodies.get(&body)?;
        self.rigid_bodies
            .get(b.handle)
            .map(|rigid_body| from_vector(rigid_body.translation()))
    }

    fn velocity(&self, body: BodyId) -> Option<Vec2> {
        let b = self.bodies.get(&body)?;
        self.rigid_bodies
            .get(b.handle)
            .map(|rigid_body| from_vector(rigid_body.linvel()))
    }

    fn apply_force(&mut self, body: BodyId, force: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body) {
            if b.active {
                b.force += force;
            }
        }
    }

    fn step(&mut self, dt: f64) -> StepResult {
        let inv_mass = 1.0 / self.mass;
        let mut before = BTreeMap::new();

        for (id, body) in self.bodies.iter_mut().filter(|(_, b)| b.active) {
            let Some(rigid_body) = self.rigid_bodies.get_mut(body.handle) else {
                continue;
            };
            let velocity = (from_vector(rigid_body.linvel()) + body.force * (inv_mass * dt))
                .limit(self.max_speed);
            rigid_body.set_linvel(to_vector(velocity), true);
            body.force = Vec2::ZERO;
            before.insert(*id, *rigid_body.translation());
        }

        self.integration_parameters.dt = dt as Real;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &self.event_handler,
        );

        let mut result = StepResult::default();
        for (id, kind) in self.drain_contacts() {
            let Some(handle) = self.bodies.get(&id).filter(|b| b.active).map(|b| b.handle) else {
                continue;
            };

            if kind == ContactKind::Wall {
                if let (Some(rigid_body), Some(position)) =
                    (self.rigid_bodies.get_mut(handle), before.get(&id))
                {
                    rigid_body.set_translation(*position, false);
                }
            }
            self.deactivate(id);

            log::trace!("Body {:?} contact {:?} at {:?}", id, kind, self.position(id));
            result.contacts.push(Contact { body: id, kind });
        }

        result
    }

    fn active_bodies(&self) -> usize {
        self.bodies.values().filter(|b| b.active).count()
    }
}

fn to_vector(v: Vec2) -> Vector2<Real> {
    Vector2::new(v.x as Real, v.y as Real)
}

fn to_point(p: Point) -> Point2<Real> {
    Point2::new(p.x as Real, p.y as Real)
}

fn from_vector(v: &Vector2<Real>) -> Vec2 {
    Vec2::new(v.x as f64, v.y as f64)
}
