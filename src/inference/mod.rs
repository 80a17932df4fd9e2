//! Model inference
//!
//! Loads the pre-trained failure classifier and RUL regressor once at
//! startup. Both are immutable afterwards and shared read-only by handlers.

pub mod forest;
pub mod registry;

use std::path::PathBuf;

use thiserror::Error;

pub use forest::{ForestClassifier, ForestRegressor, ModelKind};
pub use registry::{ModelArtifact, ModelRegistry};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read model {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid model: {0}")]
    Invalid(String),

    #[error("Expected a {expected} model, found a {found}")]
    KindMismatch { expected: ModelKind, found: ModelKind },

    #[error("Model feature names [{found}] do not match [{expected}]")]
    FeatureNames { expected: String, found: String },

    #[error("X has {found} features, but the model is expecting {expected} features as input")]
    FeatureMismatch { expected: usize, found: usize },

    #[error("Classifier has {0} class(es); a positive-class probability needs at least 2")]
    NoPositiveClass(usize),
}
