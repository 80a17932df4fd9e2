//! Loaded models and their provenance

use std::path::Path;

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::{ForestClassifier, ForestRegressor, ModelError, ModelKind};

/// Column of `predict_proba` holding the failure class
const POSITIVE_CLASS: usize = 1;

/// Where a model came from, for logs and the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ModelArtifact {
    pub path: String,
    pub kind: ModelKind,
    pub n_trees: usize,
    pub sha256: String,
    pub loaded_at: DateTime<Utc>,
}

/// Failure classifier + RUL regressor, immutable after load
#[derive(Debug)]
pub struct ModelRegistry {
    failure: ForestClassifier,
    rul: ForestRegressor,
    failure_artifact: ModelArtifact,
    rul_artifact: ModelArtifact,
}

impl ModelRegistry {
    /// Load both model files
    pub fn load(failure_path: &Path, rul_path: &Path) -> Result<Self, ModelError> {
        let bytes = read_artifact(failure_path)?;
        let failure = ForestClassifier::from_slice(&bytes)?;
        if failure.classes().len() <= POSITIVE_CLASS {
            return Err(ModelError::NoPositiveClass(failure.classes().len()));
        }
        let failure_artifact = artifact(failure_path, ModelKind::Classifier, failure.n_trees(), &bytes);

        let bytes = read_artifact(rul_path)?;
        let rul = ForestRegressor::from_slice(&bytes)?;
        let rul_artifact = artifact(rul_path, ModelKind::Regressor, rul.n_trees(), &bytes);

        tracing::info!(
            "Failure model loaded: {} ({} trees, sha256 {})",
            failure_artifact.path, failure_artifact.n_trees, failure_artifact.sha256
        );
        tracing::info!(
            "RUL model loaded: {} ({} trees, sha256 {})",
            rul_artifact.path, rul_artifact.n_trees, rul_artifact.sha256
        );

        Ok(Self {
            failure,
            rul,
            failure_artifact,
            rul_artifact,
        })
    }

    pub fn failure_model(&self) -> &ForestClassifier {
        &self.failure
    }

    pub fn rul_model(&self) -> &ForestRegressor {
        &self.rul
    }

    pub fn failure_artifact(&self) -> &ModelArtifact {
        &self.failure_artifact
    }

    pub fn rul_artifact(&self) -> &ModelArtifact {
        &self.rul_artifact
    }

    /// Failure-class probability per row of `x`
    pub fn failure_probability(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        let proba = self.failure.predict_proba(x)?;
        Ok(proba.column(POSITIVE_CLASS).to_owned())
    }
}

fn read_artifact(path: &Path) -> Result<Vec<u8>, ModelError> {
    std::fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn artifact(path: &Path, kind: ModelKind, n_trees: usize, bytes: &[u8]) -> ModelArtifact {
    ModelArtifact {
        path: path.display().to_string(),
        kind,
        n_trees,
        sha256: hex::encode(Sha256::digest(bytes)),
        loaded_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CLASSIFIER: &str = r#"{
        "kind": "classifier",
        "n_features": 5,
        "classes": [0, 1],
        "trees": [{
            "children_left": [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [3, -2, -2],
            "threshold": [50.0, -2.0, -2.0],
            "value": [[5.0, 5.0], [3.0, 1.0], [1.0, 3.0]]
        }]
    }"#;

    const REGRESSOR: &str = r#"{
        "kind": "regressor",
        "n_features": 5,
        "trees": [{
            "children_left": [-1],
            "children_right": [-1],
            "feature": [-2],
            "threshold": [-2.0],
            "value": [[42.0]]
        }]
    }"#;

    fn write_models(dir: &Path, classifier: &str) -> (std::path::PathBuf, std::path::PathBuf) {
        let failure = dir.join("classification_model.json");
        let rul = dir.join("rul_model.json");
        fs::write(&failure, classifier).unwrap();
        fs::write(&rul, REGRESSOR).unwrap();
        (failure, rul)
    }

    #[test]
    fn test_load_records_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let (failure, rul) = write_models(dir.path(), CLASSIFIER);

        let registry = ModelRegistry::load(&failure, &rul).unwrap();
        assert_eq!(registry.failure_artifact().kind, ModelKind::Classifier);
        assert_eq!(registry.rul_artifact().n_trees, 1);
        assert_eq!(
            registry.failure_artifact().sha256,
            hex::encode(Sha256::digest(CLASSIFIER.as_bytes()))
        );
        assert_eq!(registry.failure_artifact().sha256.len(), 64);
    }

    #[test]
    fn test_failure_probability_is_positive_column() {
        let dir = tempfile::tempdir().unwrap();
        let (failure, rul) = write_models(dir.path(), CLASSIFIER);
        let registry = ModelRegistry::load(&failure, &rul).unwrap();

        let x = ndarray::array![[300.0, 310.0, 1400.0, 60.0, 100.0]];
        assert_eq!(registry.failure_probability(&x).unwrap()[0], 0.75);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelRegistry::load(&dir.path().join("nope.json"), &dir.path().join("rul.json"))
            .unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }

    #[test]
    fn test_single_class_classifier_rejected() {
        let single = r#"{
            "kind": "classifier",
            "n_features": 5,
            "classes": [0],
            "trees": [{
                "children_left": [-1],
                "children_right": [-1],
                "feature": [-2],
                "threshold": [-2.0],
                "value": [[1.0]]
            }]
        }"#;
        let dir = tempfile::tempdir().unwrap();
        let (failure, rul) = write_models(dir.path(), single);
        let err = ModelRegistry::load(&failure, &rul).unwrap_err();
        assert!(matches!(err, ModelError::NoPositiveClass(1)));
    }
}
