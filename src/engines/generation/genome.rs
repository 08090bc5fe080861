//! Genome representation for the racing agents
//!
//! A genome is a fixed-length sequence of force vectors consumed one per
//! simulation step. While the owning agent drives, every gene that moved it
//! forward is copied into a per-checkpoint bucket (the *path record*).
//! Crossover works on those buckets rather than on raw gene indices, so
//! children inherit whole maneuvers tied to the part of the track where they
//! were exercised.

use super::operators::{self, MutationSettings};
use crate::data::checkpoints::CheckpointTrack;
use crate::error::{EvoRacerError, Result};
use crate::types::{ForceBounds, Gene, Point};
use rand::Rng;
use std::sync::Arc;

/// Fitness of an agent that never entered any checkpoint region
pub const OFF_TRACK_FITNESS: f64 = -1.0;

#[derive(Debug, Clone)]
pub struct Genome {
    id: usize,
    genes: Vec<Gene>,
    num_genes: usize,
    next_gene: usize,
    path_record: Vec<Vec<Gene>>,
    farthest_reached: usize,
    fitness: f64,
    mutated: bool,
    bounds: ForceBounds,
    track: Arc<CheckpointTrack>,
}

impl Genome {
    /// Generation-zero genome with `num_genes` random forces
    pub fn random<R: Rng>(
        track: Arc<CheckpointTrack>,
        num_genes: usize,
        bounds: ForceBounds,
        rng: &mut R,
    ) -> Self {
        let genes = operators::random_genes(num_genes, &bounds, rng);
        Self::assemble(track, num_genes, bounds, genes, false)
    }

    /// Genome from an explicit gene sequence, which must hold exactly `num_genes` genes
    pub fn from_genes(
        track: Arc<CheckpointTrack>,
        num_genes: usize,
        bounds: ForceBounds,
        genes: Vec<Gene>,
        mutated: bool,
    ) -> Result<Self> {
        if genes.len() != num_genes {
            return Err(EvoRacerError::InvalidGenomeLength {
                expected: num_genes,
                actual: genes.len(),
            });
        }
        Ok(Self::assemble(track, num_genes, bounds, genes, mutated))
    }

    fn assemble(
        track: Arc<CheckpointTrack>,
        num_genes: usize,
        bounds: ForceBounds,
        genes: Vec<Gene>,
        mutated: bool,
    ) -> Self {
        Self {
            id: 0,
            genes,
            num_genes,
            next_gene: 0,
            path_record: vec![Vec::new(); track.len()],
            farthest_reached: 0,
            fitness: 0.0,
            mutated,
            bounds,
            track,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Slot identity, assigned by the agent that owns this genome
    pub fn set_id(&mut self, id: usize) {
        self.id = id;
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub fn num_genes(&self) -> usize {
        self.num_genes
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn mutated(&self) -> bool {
        self.mutated
    }

    pub fn farthest_reached(&self) -> usize {
        self.farthest_reached
    }

    pub fn path_record(&self) -> &[Vec<Gene>] {
        &self.path_record
    }

    pub fn track(&self) -> &Arc<CheckpointTrack> {
        &self.track
    }

    /// Next unused gene, or `None` once the sequence is exhausted
    pub fn next_gene(&mut self) -> Option<Gene> {
        let gene = self.genes.get(self.next_gene).copied()?;
        self.next_gene += 1;
        Some(gene)
    }

    pub fn genes_used(&self) -> usize {
        self.next_gene
    }

    /// Progress score for `position`, without storing it.
    ///
    /// `(region + 1 - distance_to_exit / reference_length)^3`, or
    /// [`OFF_TRACK_FITNESS`] when the position is outside every region.
    pub fn score(&self, position: Point) -> f64 {
        let Some(region_index) = self.track.locate(position) else {
            return OFF_TRACK_FITNESS;
        };

        let distance = self
            .track
            .region(region_index)
            .map(|region| region.distance_to_exit(position))
            .unwrap_or(0.0);
        let normalized = (distance / self.track.reference_length()).clamp(0.0, 1.0);

        let progress = region_index as f64 + (1.0 - normalized);
        progress.powi(3)
    }

    pub fn calculate_fitness(&mut self, position: Point) -> f64 {
        self.fitness = self.score(position);
        self.fitness
    }

    /// Record `gene` in the bucket of the region at `position`, unless the
    /// agent is off the checkpoint sequence or behind its farthest region.
    pub fn record_step(&mut self, position: Point, gene: Gene) {
        let Some(region_index) = self.track.locate(position) else {
            return;
        };

        if region_index >= self.farthest_reached {
            self.farthest_reached = region_index;
            self.path_record[region_index].push(gene);
        }
    }

    /// Drop up to `count` genes from the end of the path record, starting at
    /// the farthest region and moving back through earlier buckets.
    ///
    /// Returns the number of genes removed.
    pub fn truncate_on_failure(&mut self, count: usize) -> usize {
        if self.path_record.is_empty() {
            return 0;
        }

        let mut remaining = count;
        let last = self.farthest_reached.min(self.path_record.len() - 1);

        for bucket in self.path_record[..=last].iter_mut().rev() {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(bucket.len());
            bucket.truncate(bucket.len() - take);
            remaining -= take;
        }

        count - remaining
    }

    /// Build a child from the path records of `self` and `partner`.
    ///
    /// Walks the checkpoint buckets in order, taking each whole bucket from a
    /// parent chosen at random, and stops at the first checkpoint neither
    /// parent recorded genes for. The result is tail-mutated and padded or
    /// cut to `num_genes`.
    pub fn crossover<R: Rng>(
        &self,
        partner: &Genome,
        mutation: &MutationSettings,
        rng: &mut R,
    ) -> Result<Genome> {
        let mut genes = Vec::with_capacity(self.num_genes);

        for (mine, theirs) in self.path_record.iter().zip(&partner.path_record) {
            if mine.is_empty() && theirs.is_empty() {
                break;
            }

            let block = if rng.gen_bool(0.5) { mine } else { theirs };
            genes.extend_from_slice(block);
        }

        let mutated = operators::mutate(&mut genes, mutation, &self.bounds, rng);
        operators::normalize_length(&mut genes, self.num_genes, &self.bounds, rng);

        Genome::from_genes(
            Arc::clone(&self.track),
            self.num_genes,
            self.bounds,
            genes,
            mutated,
        )
    }
}
