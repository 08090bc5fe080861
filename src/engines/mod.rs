pub mod generation;
pub mod physics;
pub mod simulation;

pub use simulation::{EpochState, RunSummary, Simulation};
