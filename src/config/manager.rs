use super::{
    evolution::EvolutionConfig,
    simulation::SimulationConfig,
    traits::{ConfigManifest, ConfigSection},
};
use crate::error::EvoRacerError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix for environment overrides, e.g. `EVORACER__EVOLUTION__POPULATION_SIZE=50`
pub const ENV_PREFIX: &str = "EVORACER";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
    pub simulation: SimulationConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), EvoRacerError> {
        self.evolution.validate()?;
        self.simulation.validate()?;
        Ok(())
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EvoRacerError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| EvoRacerError::Configuration(format!("Failed to read config: {}", e)))?;

        let config: AppConfig = toml::from_str(&contents)
            .map_err(|e| EvoRacerError::Configuration(format!("Failed to parse config: {}", e)))?;

        self.replace(config)
    }

    /// Defaults, then the optional TOML file, then `EVORACER__*` environment variables
    pub fn load_layered<P: AsRef<Path>>(&self, path: Option<P>) -> Result<(), EvoRacerError> {
        let mut builder =
            ::config::Config::builder().add_source(::config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::from(path.as_ref())
                    .format(::config::FileFormat::Toml)
                    .required(true),
            );
        }

        let settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        self.replace(config)
    }

    /// Field manifests of every section as pretty JSON
    pub fn manifest_json(&self) -> Result<String, EvoRacerError> {
        let config = self.get();
        let manifests: Vec<ConfigManifest> = vec![
            config.evolution.to_manifest(),
            config.simulation.to_manifest(),
        ];
        Ok(serde_json::to_string_pretty(&manifests)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EvoRacerError> {
        let toml_str = toml::to_string_pretty(&self.get())?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        match self.config.read() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update<F>(&self, f: F) -> Result<(), EvoRacerError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut candidate = self.get();
        f(&mut candidate);
        self.replace(candidate)
    }

    fn replace(&self, config: AppConfig) -> Result<(), EvoRacerError> {
        config.validate()?;
        let mut guard = self
            .config
            .write()
            .map_err(|_| EvoRacerError::Configuration("Config lock poisoned".to_string()))?;
        *guard = config;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_rejects_invalid_values() {
        let manager = ConfigManager::new();
        let result = manager.update(|c| c.evolution.mutation_rate = 2.0);
        assert!(result.is_err());

        // The previous config is kept
        assert_eq!(manager.get().evolution.mutation_rate, 0.3);
    }

    #[test]
    fn test_manifest_json_lists_sections() {
        let json = ConfigManager::new().manifest_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[0]["section"], "Evolution");
        assert_eq!(value[1]["section"], "Simulation");
        assert_eq!(value[0]["fields"][0]["name"], "population_size");
    }

    #[test]
    fn test_toml_round_trip_through_files() {
        let dir = std::env::temp_dir().join(format!("evoracer-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let manager = ConfigManager::new();
        manager
            .update(|c| {
                c.evolution.population_size = 42;
                c.simulation.lifespan = 300;
            })
            .unwrap();
        manager.save_to_file(&path).unwrap();

        let reloaded = ConfigManager::new();
        reloaded.load_from_file(&path).unwrap();
        assert_eq!(reloaded.get().evolution.population_size, 42);
        assert_eq!(reloaded.get().simulation.lifespan, 300);

        let layered = ConfigManager::new();
        layered.load_layered(Some(&path)).unwrap();
        assert_eq!(layered.get().evolution.population_size, 42);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = std::env::temp_dir().join(format!("evoracer-partial-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("partial.toml");
        std::fs::write(&path, "[evolution]\nmutation_rate = 0.05\n").unwrap();

        let manager = ConfigManager::new();
        manager.load_from_file(&path).unwrap();
        let config = manager.get();
        assert_eq!(config.evolution.mutation_rate, 0.05);
        assert_eq!(config.evolution.population_size, 20);
        assert_eq!(config.simulation.lifespan, 1500);

        std::fs::remove_dir_all(&dir).ok();
    }
}
