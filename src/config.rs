//! Configuration module

use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Failure classifier artifact
    pub failure_model_path: PathBuf,

    /// RUL regressor artifact
    pub rul_model_path: PathBuf,

    /// Machine time-series CSV
    pub dataset_path: PathBuf,

    /// CSV column holding the machine identifier
    pub dataset_key_column: String,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            failure_model_path: PathBuf::from("model/classification_model.json"),
            rul_model_path: PathBuf::from("model/rul_model.json"),
            dataset_path: PathBuf::from("predictive_maintenance.csv"),
            dataset_key_column: "UDI".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: var("HOST").unwrap_or(defaults.host),

            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            failure_model_path: var("FAILURE_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.failure_model_path),

            rul_model_path: var("RUL_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.rul_model_path),

            dataset_path: var("DATASET_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.dataset_path),

            dataset_key_column: var("DATASET_KEY_COLUMN").unwrap_or(defaults.dataset_key_column),

            environment: var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
