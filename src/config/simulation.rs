use super::traits::{ConfigManifest, ConfigSection, FieldManifest};
use crate::error::EvoRacerError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Steps per epoch before the generation is forced to end
    pub lifespan: usize,
    /// Physics step length in seconds
    pub time_step: f64,
    /// Generations to run before giving up on reaching the finish
    pub max_generations: usize,
    pub body_mass: f64,
    pub max_speed: f64,
    /// Number of best positions from previous epochs to keep
    pub endpoint_trail: usize,
    pub track_file: PathBuf,
    /// Length used to normalise the distance to a checkpoint exit.
    /// Derived from the track extent when unset.
    pub reference_length: Option<f64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            lifespan: 1500,
            time_step: 0.01,
            max_generations: 500,
            body_mass: 1.0,
            max_speed: 1000.0,
            endpoint_trail: 5,
            track_file: PathBuf::from("tracks/zigzag.txt"),
            reference_length: None,
        }
    }
}

impl ConfigSection for SimulationConfig {
    fn section_name() -> &'static str {
        "simulation"
    }

    fn validate(&self) -> Result<(), EvoRacerError> {
        if self.lifespan == 0 {
            return Err(EvoRacerError::Configuration(
                "Lifespan must be at least 1 step".to_string(),
            ));
        }
        if !(self.time_step > 0.0) {
            return Err(EvoRacerError::Configuration(
                "Time step must be positive".to_string(),
            ));
        }
        if !(self.body_mass > 0.0) || !(self.max_speed > 0.0) {
            return Err(EvoRacerError::Configuration(
                "Body mass and max speed must be positive".to_string(),
            ));
        }
        if let Some(length) = self.reference_length {
            if !(length > 0.0) {
                return Err(EvoRacerError::Configuration(
                    "Reference length must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "Simulation".to_string(),
            fields: vec![
                FieldManifest::new(
                    "lifespan",
                    "integer",
                    serde_json::json!(1500),
                    Some((1.0, 100000.0)),
                    "Steps per generation",
                ),
                FieldManifest::new(
                    "time_step",
                    "float",
                    serde_json::json!(0.01),
                    Some((0.0001, 1.0)),
                    "Physics step in seconds",
                ),
                FieldManifest::new(
                    "max_generations",
                    "integer",
                    serde_json::json!(500),
                    Some((1.0, 1000000.0)),
                    "Generations before the run stops",
                ),
                FieldManifest::new(
                    "body_mass",
                    "float",
                    serde_json::json!(1.0),
                    None,
                    "Mass of each car",
                ),
                FieldManifest::new(
                    "max_speed",
                    "float",
                    serde_json::json!(1000.0),
                    None,
                    "Speed cap in track units per second",
                ),
                FieldManifest::new(
                    "endpoint_trail",
                    "integer",
                    serde_json::json!(5),
                    Some((0.0, 1000.0)),
                    "Best positions remembered across generations",
                ),
                FieldManifest::new(
                    "track_file",
                    "path",
                    serde_json::json!("tracks/zigzag.txt"),
                    None,
                    "Track wall/checkpoint file",
                ),
            ],
        }
    }
}
