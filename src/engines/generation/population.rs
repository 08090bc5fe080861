use super::{
    agent::{Agent, AgentState},
    genome::Genome,
    operators::{self, MutationSettings},
};
use crate::config::EvolutionConfig;
use crate::data::checkpoints::CheckpointTrack;
use crate::engines::physics::{ContactKind, Physics, StepResult};
use crate::error::{EvoRacerError, Result};
use crate::types::Point;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Fixed-size set of cars, evolved once per epoch.
///
/// Each slot keeps its id across generations; only [`Population::generate`]
/// replaces slots, and it replaces all of them in one pass.
pub struct Population {
    agents: Vec<Agent>,
    mating_pool: Vec<usize>,
    generations: usize,
    track: Arc<CheckpointTrack>,
    start_point: Point,
    mutation: MutationSettings,
    end_spread: usize,
    elitism_bonus: usize,
    rng: StdRng,
}

impl Population {
    pub fn new<P: Physics + ?Sized>(
        config: &EvolutionConfig,
        track: Arc<CheckpointTrack>,
        start_point: Point,
        physics: &mut P,
    ) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, track, start_point, physics, rng)
    }

    pub fn with_rng<P: Physics + ?Sized>(
        config: &EvolutionConfig,
        track: Arc<CheckpointTrack>,
        start_point: Point,
        physics: &mut P,
        mut rng: StdRng,
    ) -> Result<Self> {
        if config.population_size == 0 {
            return Err(EvoRacerError::Configuration(
                "Population size must be at least 1".to_string(),
            ));
        }

        let bounds = config.force_bounds();
        let agents = (0..config.population_size)
            .map(|id| {
                let genome = Genome::random(Arc::clone(&track), config.num_genes, bounds, &mut rng);
                let body = physics.spawn(start_point);
                Agent::new(id, genome, body, start_point, config.end_spread)
            })
            .collect();

        log::info!(
            "Created population of {} cars with {} genes each",
            config.population_size,
            config.num_genes
        );

        Ok(Self {
            agents,
            mating_pool: Vec::new(),
            generations: 0,
            track,
            start_point,
            mutation: MutationSettings::from(config),
            end_spread: config.end_spread,
            elitism_bonus: config.elitism_bonus,
            rng,
        })
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn generations(&self) -> usize {
        self.generations
    }

    pub fn mating_pool(&self) -> &[usize] {
        &self.mating_pool
    }

    pub fn start_point(&self) -> Point {
        self.start_point
    }

    pub fn track(&self) -> &Arc<CheckpointTrack> {
        &self.track
    }

    /// Feed every live car its next gene
    pub fn next_forces<P: Physics + ?Sized>(&mut self, physics: &mut P) {
        for agent in &mut self.agents {
            agent.next_force(physics);
        }
    }

    /// Deliver contact events from one physics step. Returns the id of the
    /// first car that reached the finish line, if any.
    pub fn apply_contacts<P: Physics + ?Sized>(
        &mut self,
        result: &StepResult,
        physics: &mut P,
    ) -> Option<usize> {
        let mut finisher = None;

        for contact in &result.contacts {
            let Some(agent) = self.agents.iter_mut().find(|a| a.body() == contact.body) else {
                continue;
            };

            match contact.kind {
                ContactKind::Wall => agent.on_wall_contact(),
                ContactKind::FinishLine => {
                    agent.on_finish_contact();
                    finisher.get_or_insert(agent.id());
                }
            }
            physics.deactivate(contact.body);
        }

        finisher
    }

    /// Whether no car can move any more this epoch
    pub fn all_inactive(&self) -> bool {
        self.agents.iter().all(Agent::is_dead)
    }

    pub fn finisher(&self) -> Option<&Agent> {
        self.agents.iter().find(|a| a.finished())
    }

    /// Stop every body, e.g. once a car has finished
    pub fn freeze<P: Physics + ?Sized>(&self, physics: &mut P) {
        for agent in &self.agents {
            physics.deactivate(agent.body());
        }
    }

    pub fn calculate_fitness<P: Physics + ?Sized>(&mut self, physics: &P) {
        for agent in &mut self.agents {
            agent.calculate_fitness(physics);
        }
    }

    pub fn best_fitness(&self) -> f64 {
        self.agents
            .iter()
            .map(|a| a.genome().fitness())
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Rebuild the mating pool from the current fitness values.
    ///
    /// The pool holds slot indices; see [`operators::mating_pool_counts`] for
    /// how many entries each slot receives.
    pub fn fitness_proportionate_selection(&mut self) -> Result<&[usize]> {
        let fitnesses: Vec<f64> = self.agents.iter().map(|a| a.genome().fitness()).collect();
        if fitnesses.iter().all(|f| *f <= 0.0) {
            log::warn!("No car made positive progress, selecting parents uniformly");
        }

        let counts = operators::mating_pool_counts(&fitnesses, self.elitism_bonus);

        self.mating_pool.clear();
        for (slot, &count) in counts.iter().enumerate() {
            log::debug!(
                "Car {} with fitness {:.4} gets {} mating pool entries",
                self.agents[slot].id(),
                fitnesses[slot],
                count
            );
            self.mating_pool.extend(std::iter::repeat(slot).take(count));
        }

        if self.mating_pool.is_empty() {
            return Err(EvoRacerError::EmptyMatingPool);
        }

        log::debug!("Mating pool size: {}", self.mating_pool.len());
        Ok(&self.mating_pool)
    }

    /// Replace every car with a child of two parents drawn from the mating pool
    pub fn generate<P: Physics + ?Sized>(&mut self, physics: &mut P) -> Result<()> {
        if self.mating_pool.is_empty() {
            self.fitness_proportionate_selection()?;
        }

        let mut children = Vec::with_capacity(self.agents.len());
        for slot in 0..self.agents.len() {
            let a = self.mating_pool[self.rng.gen_range(0..self.mating_pool.len())];
            let b = self.mating_pool[self.rng.gen_range(0..self.mating_pool.len())];

            let child = self.agents[a]
                .genome()
                .crossover(self.agents[b].genome(), &self.mutation, &mut self.rng)?;

            log::debug!(
                "New genome for car {}: parents {} x {}, mutated: {}",
                self.agents[slot].id(),
                self.agents[a].id(),
                self.agents[b].id(),
                child.mutated()
            );
            children.push(child);
        }

        for (agent, child) in self.agents.iter_mut().zip(children) {
            let id = agent.id();
            physics.remove(agent.body());
            let body = physics.spawn(self.start_point);
            *agent = Agent::new(id, child, body, self.start_point, self.end_spread);
        }

        self.mating_pool.clear();
        self.generations += 1;
        log::info!("Generation #{}", self.generations);

        Ok(())
    }

    /// Position of the fittest car; ties go to the first in slot order
    pub fn evaluate<P: Physics + ?Sized>(&self, physics: &P) -> Option<Point> {
        let mut best: Option<&Agent> = None;
        for agent in &self.agents {
            let better = best.map_or(true, |current| {
                agent.genome().fitness() > current.genome().fitness()
            });
            if better {
                best = Some(agent);
            }
        }

        let best = best?;
        log::info!(
            "Best fitness: {:.4} (car {})",
            best.genome().fitness(),
            best.id()
        );
        Some(best.position(physics))
    }

    pub fn agent_states<P: Physics + ?Sized>(&self, physics: &P) -> Vec<AgentState> {
        self.agents.iter().map(|a| a.display_state(physics)).collect()
    }
}
