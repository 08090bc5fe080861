//! Lockstep simulation driver and generational state machine

use crate::config::AppConfig;
use crate::data::connectors::TrackLayout;
use crate::engines::generation::{AgentState, Population, ProgressCallback};
use crate::engines::physics::Physics;
use crate::error::Result;
use crate::types::Point;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpochState {
    Running,
    EpochBoundary,
    Finished,
}

/// Outcome of [`Simulation::run`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub generations: usize,
    pub winner: Option<usize>,
    pub best_fitness: f64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub elapsed_secs: f64,
}

impl RunSummary {
    pub fn finished(&self) -> bool {
        self.winner.is_some()
    }
}

/// Owns all state of one run: physics, population and epoch counters
pub struct Simulation<P: Physics> {
    physics: P,
    population: Population,
    state: EpochState,
    life_counter: usize,
    lifespan: usize,
    time_step: f64,
    endpoints: VecDeque<Point>,
    endpoint_trail: usize,
    last_best_fitness: f64,
    winner: Option<usize>,
    started_at: DateTime<Utc>,
}

impl<P: Physics> Simulation<P> {
    pub fn new(config: &AppConfig, layout: &TrackLayout, mut physics: P) -> Result<Self> {
        config.validate()?;

        let mut checkpoints = layout.checkpoints.clone();
        if let Some(length) = config.simulation.reference_length {
            checkpoints = checkpoints.with_reference_length(length);
        }

        let population = Population::new(
            &config.evolution,
            Arc::new(checkpoints),
            layout.start_point,
            &mut physics,
        )?;

        Ok(Self::from_parts(physics, population, config))
    }

    /// Wrap an existing population, e.g. one built with a seeded rng
    pub fn from_parts(physics: P, population: Population, config: &AppConfig) -> Self {
        Self {
            physics,
            population,
            state: EpochState::Running,
            life_counter: 0,
            lifespan: config.simulation.lifespan,
            time_step: config.simulation.time_step,
            endpoints: VecDeque::with_capacity(config.simulation.endpoint_trail),
            endpoint_trail: config.simulation.endpoint_trail,
            last_best_fitness: f64::NEG_INFINITY,
            winner: None,
            started_at: Utc::now(),
        }
    }

    pub fn state(&self) -> EpochState {
        self.state
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    pub fn life_counter(&self) -> usize {
        self.life_counter
    }

    pub fn generations(&self) -> usize {
        self.population.generations()
    }

    /// Best positions of the most recent epochs, oldest first
    pub fn endpoints(&self) -> impl Iterator<Item = &Point> {
        self.endpoints.iter()
    }

    pub fn winner(&self) -> Option<usize> {
        self.winner
    }

    pub fn agent_states(&self) -> Vec<AgentState> {
        self.population.agent_states(&self.physics)
    }

    /// Advance every live car by one gene and one physics step, then end the
    /// epoch if the lifespan is used up or no car can move.
    pub fn tick<C: ProgressCallback>(&mut self, callback: &mut C) -> Result<EpochState> {
        if self.state == EpochState::Finished {
            return Ok(self.state);
        }

        if self.life_counter == 0 {
            callback.on_generation_start(self.population.generations());
        }

        self.population.next_forces(&mut self.physics);
        let result = self.physics.step(self.time_step);

        if let Some(id) = self.population.apply_contacts(&result, &mut self.physics) {
            self.finish(id, callback);
            return Ok(self.state);
        }

        self.life_counter += 1;
        if self.life_counter >= self.lifespan || self.population.all_inactive() {
            self.end_epoch(callback)?;
        }

        Ok(self.state)
    }

    /// Score, select, remember the best position and breed the next generation
    pub fn end_epoch<C: ProgressCallback>(&mut self, callback: &mut C) -> Result<()> {
        self.state = EpochState::EpochBoundary;
        let generation = self.population.generations();

        self.population.calculate_fitness(&self.physics);
        let pool_size = self.population.fitness_proportionate_selection()?.len();

        if let Some(best) = self.population.evaluate(&self.physics) {
            self.push_endpoint(best);
        }
        self.last_best_fitness = self.population.best_fitness();
        callback.on_generation_complete(generation, self.last_best_fitness, pool_size);

        self.population.generate(&mut self.physics)?;

        self.life_counter = 0;
        self.state = EpochState::Running;
        Ok(())
    }

    /// Tick until a car finishes or `max_generations` epochs have completed
    pub fn run<C: ProgressCallback>(&mut self, max_generations: usize, mut callback: C) -> Result<RunSummary> {
        self.started_at = Utc::now();

        while self.state != EpochState::Finished
            && self.population.generations() < max_generations
        {
            self.tick(&mut callback)?;
        }

        Ok(self.summary())
    }

    pub fn summary(&self) -> RunSummary {
        let ended_at = Utc::now();
        let elapsed = ended_at.signed_duration_since(self.started_at);
        RunSummary {
            generations: self.population.generations(),
            winner: self.winner,
            best_fitness: self.last_best_fitness,
            started_at: self.started_at,
            ended_at,
            elapsed_secs: elapsed.num_milliseconds() as f64 / 1000.0,
        }
    }

    fn finish<C: ProgressCallback>(&mut self, id: usize, callback: &mut C) {
        self.state = EpochState::Finished;
        self.winner = Some(id);
        self.population.freeze(&mut self.physics);

        log::info!(
            "Car {} finished the track in generation {}",
            id,
            self.population.generations()
        );
        callback.on_finished(self.population.generations(), id);
    }

    fn push_endpoint(&mut self, point: Point) {
        if self.endpoint_trail == 0 {
            return;
        }
        if self.endpoints.len() == self.endpoint_trail {
            self.endpoints.pop_front();
        }
        self.endpoints.push_back(point);
    }
}
