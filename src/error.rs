use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvoRacerError {
    #[error("Invalid genome length: expected {expected}, got {actual}")]
    InvalidGenomeLength { expected: usize, actual: usize },

    #[error("Mating pool is empty")]
    EmptyMatingPool,

    #[error("Track loading error: {0}")]
    TrackLoading(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Config error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, EvoRacerError>;
