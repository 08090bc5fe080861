use super::traits::{ConfigManifest, ConfigSection, FieldManifest};
use crate::error::EvoRacerError;
use crate::types::ForceBounds;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    /// Number of genes (force vectors) each genome carries
    pub num_genes: usize,
    /// Probability in [0, 1] that a child's tail gets re-randomised
    pub mutation_rate: f64,
    /// Lower bound of the tail fraction replaced by a mutation
    pub mutation_fraction_min: f64,
    /// Upper bound of the tail fraction replaced by a mutation
    pub mutation_fraction_max: f64,
    /// Genes stripped from the path record when an agent hits a wall
    pub end_spread: usize,
    /// Extra mating pool entries for the fittest genome(s)
    pub elitism_bonus: usize,
    pub max_force_x: f64,
    pub max_force_y: f64,
    pub seed: Option<u64>,
}

impl EvolutionConfig {
    pub fn force_bounds(&self) -> ForceBounds {
        ForceBounds::new(self.max_force_x, self.max_force_y)
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 20,
            num_genes: 1500,
            mutation_rate: 0.3,
            mutation_fraction_min: 0.1,
            mutation_fraction_max: 0.3,
            end_spread: 50,
            elitism_bonus: 25,
            max_force_x: 5000.0,
            max_force_y: 3000.0,
            seed: None,
        }
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), EvoRacerError> {
        if self.population_size == 0 {
            return Err(EvoRacerError::Configuration(
                "Population size must be at least 1".to_string(),
            ));
        }
        if self.num_genes == 0 {
            return Err(EvoRacerError::Configuration(
                "Genome length must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(EvoRacerError::Configuration(
                "Mutation rate must be between 0 and 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_fraction_min)
            || !(0.0..=1.0).contains(&self.mutation_fraction_max)
            || self.mutation_fraction_min > self.mutation_fraction_max
        {
            return Err(EvoRacerError::Configuration(format!(
                "Mutation fraction range {}..={} is invalid",
                self.mutation_fraction_min, self.mutation_fraction_max
            )));
        }
        if !(self.max_force_x > 0.0 && self.max_force_y > 0.0) {
            return Err(EvoRacerError::Configuration(
                "Force bounds must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "Evolution".to_string(),
            fields: vec![
                FieldManifest::new(
                    "population_size",
                    "integer",
                    serde_json::json!(20),
                    Some((1.0, 10000.0)),
                    "Number of cars in each generation",
                ),
                FieldManifest::new(
                    "num_genes",
                    "integer",
                    serde_json::json!(1500),
                    Some((1.0, 100000.0)),
                    "Force vectors per genome",
                ),
                FieldManifest::new(
                    "mutation_rate",
                    "float",
                    serde_json::json!(0.3),
                    Some((0.0, 1.0)),
                    "Chance that a child's tail is re-randomised",
                ),
                FieldManifest::new(
                    "mutation_fraction_min",
                    "float",
                    serde_json::json!(0.1),
                    Some((0.0, 1.0)),
                    "Smallest share of the tail replaced by a mutation",
                ),
                FieldManifest::new(
                    "mutation_fraction_max",
                    "float",
                    serde_json::json!(0.3),
                    Some((0.0, 1.0)),
                    "Largest share of the tail replaced by a mutation",
                ),
                FieldManifest::new(
                    "end_spread",
                    "integer",
                    serde_json::json!(50),
                    Some((0.0, 100000.0)),
                    "Genes dropped from the path record on a wall hit",
                ),
                FieldManifest::new(
                    "elitism_bonus",
                    "integer",
                    serde_json::json!(25),
                    Some((0.0, 1000.0)),
                    "Extra mating pool slots for the best car",
                ),
                FieldManifest::new(
                    "max_force_x",
                    "float",
                    serde_json::json!(5000.0),
                    None,
                    "Largest horizontal force component",
                ),
                FieldManifest::new(
                    "max_force_y",
                    "float",
                    serde_json::json!(3000.0),
                    None,
                    "Largest vertical force component",
                ),
                FieldManifest::new(
                    "seed",
                    "integer",
                    serde_json::Value::Null,
                    None,
                    "Random seed, empty for a fresh run each time",
                ),
            ],
        }
    }
}
