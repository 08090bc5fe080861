use super::genome::Genome;
use crate::engines::physics::{BodyId, Physics};
use crate::types::{Gene, Point, Vec2};
use serde::{Deserialize, Serialize};

/// A car: one genome bound to one physics body for one epoch
#[derive(Debug, Clone)]
pub struct Agent {
    id: usize,
    genome: Genome,
    body: BodyId,
    last_position: Point,
    end_spread: usize,
    is_dead: bool,
    finished: bool,
}

/// Per-tick snapshot for renderers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub id: usize,
    pub position: Point,
    pub velocity: Vec2,
    pub is_dead: bool,
    pub finished: bool,
    pub mutated: bool,
    pub genes_used: usize,
}

impl Agent {
    pub fn new(id: usize, mut genome: Genome, body: BodyId, start: Point, end_spread: usize) -> Self {
        genome.set_id(id);
        Self {
            id,
            genome,
            body,
            last_position: start,
            end_spread,
            is_dead: false,
            finished: false,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn last_position(&self) -> Point {
        self.last_position
    }

    /// Apply the next unused gene to the body and record it in the path record
    pub fn next_force<P: Physics + ?Sized>(&mut self, physics: &mut P) -> Option<Gene> {
        if self.is_dead {
            return None;
        }

        let gene = self.genome.next_gene()?;
        physics.apply_force(self.body, gene);

        if let Some(position) = physics.position(self.body) {
            self.last_position = position;
        }
        self.genome.record_step(self.last_position, gene);

        Some(gene)
    }

    /// The car hit a wall: it stops, and the genes that led it there are
    /// dropped from its path record.
    pub fn on_wall_contact(&mut self) {
        if self.is_dead {
            return;
        }
        self.is_dead = true;
        let removed = self.genome.truncate_on_failure(self.end_spread);
        log::trace!("Car {} hit a wall, dropped {} recorded genes", self.id, removed);
    }

    pub fn on_finish_contact(&mut self) {
        self.finished = true;
        self.is_dead = true;
    }

    /// Score the genome at the body's current position
    pub fn calculate_fitness<P: Physics + ?Sized>(&mut self, physics: &P) -> f64 {
        if let Some(position) = physics.position(self.body) {
            self.last_position = position;
        }
        self.genome.calculate_fitness(self.last_position)
    }

    pub fn position<P: Physics + ?Sized>(&self, physics: &P) -> Point {
        physics.position(self.body).unwrap_or(self.last_position)
    }

    pub fn display_state<P: Physics + ?Sized>(&self, physics: &P) -> AgentState {
        AgentState {
            id: self.id,
            position: self.position(physics),
            velocity: physics.velocity(self.body).unwrap_or(Vec2::ZERO),
            is_dead: self.is_dead,
            finished: self.finished,
            mutated: self.genome.mutated(),
            genes_used: self.genome.genes_used(),
        }
    }
}
