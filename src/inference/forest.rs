//! Random forest inference
//!
//! Inference only. Forests are trained elsewhere and exported as JSON using
//! the training library's flat tree layout: per tree, parallel arrays
//! `children_left`, `children_right`, `feature`, `threshold` and `value`,
//! indexed by node id. A node is a leaf when `children_left == -1`; otherwise
//! a sample goes left when `x[feature] <= threshold`.
//!
//! - Classifier: leaf `value` holds per-class sample counts (or fractions).
//!   Each tree's leaf is normalised to a distribution and the distributions
//!   are averaged across trees.
//! - Regressor: leaf `value` holds a single prediction; trees are averaged.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::models::FEATURE_NAMES;

/// Leaf marker in `children_left` / `children_right`
const TREE_LEAF: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Classifier,
    Regressor,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Classifier => write!(f, "classifier"),
            ModelKind::Regressor => write!(f, "regressor"),
        }
    }
}

// ============================================================================
// SERIALIZED FORM
// ============================================================================

/// Tree arrays as exported by the training scripts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeData {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

/// Whole forest artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestData {
    pub kind: ModelKind,
    pub n_features: usize,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    #[serde(default)]
    pub classes: Option<Vec<i64>>,
    pub trees: Vec<TreeData>,
}

impl ForestData {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn check_header(&self, expected: ModelKind) -> Result<(), ModelError> {
        if self.kind != expected {
            return Err(ModelError::KindMismatch {
                expected,
                found: self.kind,
            });
        }
        if self.trees.is_empty() {
            return Err(ModelError::Invalid("forest has no trees".to_string()));
        }
        if let Some(names) = &self.feature_names {
            if names.iter().map(String::as_str).ne(FEATURE_NAMES) {
                return Err(ModelError::FeatureNames {
                    expected: FEATURE_NAMES.join(", "),
                    found: names.join(", "),
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// DECISION TREE
// ============================================================================

#[derive(Debug, Clone)]
struct Node {
    left: usize,
    right: usize,
    feature: usize,
    threshold: f64,
}

/// Validated tree: internal nodes have in-range children and features,
/// and children always have a larger id than their parent so traversal
/// terminates.
#[derive(Debug, Clone)]
struct DecisionTree {
    nodes: Vec<Option<Node>>,
    values: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn from_data(
        index: usize,
        data: TreeData,
        n_features: usize,
        value_width: usize,
    ) -> Result<Self, ModelError> {
        let n_nodes = data.children_left.len();
        let invalid = |msg: String| ModelError::Invalid(format!("tree {}: {}", index, msg));

        if n_nodes == 0 {
            return Err(invalid("no nodes".to_string()));
        }
        if data.children_right.len() != n_nodes
            || data.feature.len() != n_nodes
            || data.threshold.len() != n_nodes
            || data.value.len() != n_nodes
        {
            return Err(invalid("node arrays differ in length".to_string()));
        }

        let mut nodes = Vec::with_capacity(n_nodes);
        for id in 0..n_nodes {
            let (left, right) = (data.children_left[id], data.children_right[id]);

            if left == TREE_LEAF {
                if data.value[id].len() != value_width {
                    return Err(invalid(format!(
                        "leaf {} has {} values, expected {}",
                        id,
                        data.value[id].len(),
                        value_width
                    )));
                }
                nodes.push(None);
                continue;
            }

            let child = |c: i64| -> Result<usize, ModelError> {
                usize::try_from(c)
                    .ok()
                    .filter(|&c| c > id && c < n_nodes)
                    .ok_or_else(|| invalid(format!("node {} has invalid child {}", id, c)))
            };
            let feature = usize::try_from(data.feature[id])
                .ok()
                .filter(|&f| f < n_features)
                .ok_or_else(|| {
                    invalid(format!("node {} splits on invalid feature {}", id, data.feature[id]))
                })?;

            nodes.push(Some(Node {
                left: child(left)?,
                right: child(right)?,
                feature,
                threshold: data.threshold[id],
            }));
        }

        Ok(Self {
            nodes,
            values: data.value,
        })
    }

    /// Leaf value reached by `row`
    fn leaf(&self, row: ArrayView1<f64>) -> &[f64] {
        let mut id = 0;
        while let Some(node) = &self.nodes[id] {
            id = if row[node.feature] <= node.threshold {
                node.left
            } else {
                node.right
            };
        }
        &self.values[id]
    }
}

fn build_trees(
    trees: Vec<TreeData>,
    n_features: usize,
    value_width: usize,
) -> Result<Vec<DecisionTree>, ModelError> {
    trees
        .into_iter()
        .enumerate()
        .map(|(i, t)| DecisionTree::from_data(i, t, n_features, value_width))
        .collect()
}

fn check_columns(x: &Array2<f64>, n_features: usize) -> Result<(), ModelError> {
    if x.ncols() != n_features {
        return Err(ModelError::FeatureMismatch {
            expected: n_features,
            found: x.ncols(),
        });
    }
    Ok(())
}

// ============================================================================
// CLASSIFIER
// ============================================================================

#[derive(Debug, Clone)]
pub struct ForestClassifier {
    n_features: usize,
    classes: Vec<i64>,
    trees: Vec<DecisionTree>,
}

impl ForestClassifier {
    pub fn from_data(data: ForestData) -> Result<Self, ModelError> {
        data.check_header(ModelKind::Classifier)?;

        let classes = data
            .classes
            .ok_or_else(|| ModelError::Invalid("classifier has no classes".to_string()))?;
        if classes.is_empty() {
            return Err(ModelError::Invalid("classifier has no classes".to_string()));
        }

        let trees = build_trees(data.trees, data.n_features, classes.len())?;
        Ok(Self {
            n_features: data.n_features,
            classes,
            trees,
        })
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        Self::from_data(ForestData::from_slice(bytes)?)
    }

    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Averaged class probabilities, shape `(n_rows, n_classes)`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        check_columns(x, self.n_features)?;

        let mut proba = Array2::<f64>::zeros((x.nrows(), self.classes.len()));
        for (row, mut out) in x.axis_iter(Axis(0)).zip(proba.axis_iter_mut(Axis(0))) {
            for tree in &self.trees {
                let leaf = tree.leaf(row);
                let total: f64 = leaf.iter().sum();
                let norm = if total > 0.0 { total } else { 1.0 };
                for (o, v) in out.iter_mut().zip(leaf) {
                    *o += v / norm;
                }
            }
        }
        proba /= self.trees.len() as f64;
        Ok(proba)
    }

    /// Most probable class label per row (lowest class index on ties)
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>, ModelError> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .axis_iter(Axis(0))
            .map(|row| {
                let mut best = 0;
                for (i, p) in row.iter().enumerate() {
                    if *p > row[best] {
                        best = i;
                    }
                }
                self.classes[best]
            })
            .collect())
    }
}

// ============================================================================
// REGRESSOR
// ============================================================================

#[derive(Debug, Clone)]
pub struct ForestRegressor {
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl ForestRegressor {
    pub fn from_data(data: ForestData) -> Result<Self, ModelError> {
        data.check_header(ModelKind::Regressor)?;
        let trees = build_trees(data.trees, data.n_features, 1)?;
        Ok(Self {
            n_features: data.n_features,
            trees,
        })
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        Self::from_data(ForestData::from_slice(bytes)?)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean of the trees' leaf values per row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        check_columns(x, self.n_features)?;

        let n_trees = self.trees.len() as f64;
        Ok(x.axis_iter(Axis(0))
            .map(|row| self.trees.iter().map(|t| t.leaf(row)[0]).sum::<f64>() / n_trees)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Two stumps on torque (column 3) and tool wear (column 4)
    const CLASSIFIER_JSON: &str = r#"{
        "kind": "classifier",
        "n_features": 5,
        "feature_names": ["air_temperature", "process_temperature", "rotational_speed", "torque", "tool_wear"],
        "classes": [0, 1],
        "trees": [
            {
                "children_left": [1, -1, -1],
                "children_right": [2, -1, -1],
                "feature": [3, -2, -2],
                "threshold": [50.0, -2.0, -2.0],
                "value": [[10.0, 10.0], [9.0, 1.0], [1.0, 9.0]]
            },
            {
                "children_left": [1, -1, -1],
                "children_right": [2, -1, -1],
                "feature": [4, -2, -2],
                "threshold": [200.0, -2.0, -2.0],
                "value": [[10.0, 10.0], [8.0, 2.0], [0.0, 10.0]]
            }
        ]
    }"#;

    const REGRESSOR_JSON: &str = r#"{
        "kind": "regressor",
        "n_features": 5,
        "trees": [
            {
                "children_left": [1, -1, -1],
                "children_right": [2, -1, -1],
                "feature": [4, -2, -2],
                "threshold": [100.0, -2.0, -2.0],
                "value": [[150.0], [200.0], [100.0]]
            },
            {
                "children_left": [-1],
                "children_right": [-1],
                "feature": [-2],
                "threshold": [-2.0],
                "value": [[120.0]]
            }
        ]
    }"#;

    fn row(torque: f64, tool_wear: f64) -> Array2<f64> {
        array![[298.0, 308.0, 1500.0, torque, tool_wear]]
    }

    #[test]
    fn test_classifier_proba_averages_trees() {
        let model = ForestClassifier::from_slice(CLASSIFIER_JSON.as_bytes()).unwrap();
        assert_eq!(model.n_trees(), 2);

        // Tree 1 -> [0.9, 0.1], tree 2 -> [0.8, 0.2]
        let proba = model.predict_proba(&row(40.0, 10.0)).unwrap();
        assert_eq!(proba.shape(), &[1, 2]);
        assert!((proba[[0, 1]] - 0.15).abs() < 1e-12);
        assert!((proba.row(0).sum() - 1.0).abs() < 1e-12);

        // Tree 1 -> [0.1, 0.9], tree 2 -> [0.0, 1.0]
        let proba = model.predict_proba(&row(60.0, 250.0)).unwrap();
        assert!((proba[[0, 1]] - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_classifier_predict_labels() {
        let model = ForestClassifier::from_slice(CLASSIFIER_JSON.as_bytes()).unwrap();
        let x = ndarray::concatenate![Axis(0), row(40.0, 10.0), row(60.0, 250.0)];
        assert_eq!(model.predict(&x).unwrap().to_vec(), vec![0, 1]);
    }

    #[test]
    fn test_threshold_is_inclusive_left() {
        let model = ForestClassifier::from_slice(CLASSIFIER_JSON.as_bytes()).unwrap();
        // torque == 50 goes left in tree 1
        let proba = model.predict_proba(&row(50.0, 10.0)).unwrap();
        assert!((proba[[0, 1]] - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_regressor_mean_of_trees() {
        let model = ForestRegressor::from_slice(REGRESSOR_JSON.as_bytes()).unwrap();
        assert_eq!(model.predict(&row(40.0, 10.0)).unwrap()[0], 160.0);
        assert_eq!(model.predict(&row(40.0, 180.0)).unwrap()[0], 110.0);
    }

    #[test]
    fn test_feature_count_mismatch() {
        let model = ForestRegressor::from_slice(REGRESSOR_JSON.as_bytes()).unwrap();
        let err = model.predict(&array![[1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, ModelError::FeatureMismatch { expected: 5, found: 2 }));
    }

    #[test]
    fn test_kind_mismatch() {
        let err = ForestRegressor::from_slice(CLASSIFIER_JSON.as_bytes()).unwrap_err();
        assert!(matches!(err, ModelError::KindMismatch { .. }));
    }

    #[test]
    fn test_rejects_feature_name_drift() {
        let json = CLASSIFIER_JSON.replace("\"torque\", \"tool_wear\"", "\"tool_wear\", \"torque\"");
        let err = ForestClassifier::from_slice(json.as_bytes()).unwrap_err();
        assert!(matches!(err, ModelError::FeatureNames { .. }));
    }

    #[test]
    fn test_rejects_backward_child() {
        let json = r#"{
            "kind": "regressor",
            "n_features": 5,
            "trees": [{
                "children_left": [0, -1],
                "children_right": [1, -1],
                "feature": [0, -2],
                "threshold": [1.0, -2.0],
                "value": [[1.0], [2.0]]
            }]
        }"#;
        let err = ForestRegressor::from_slice(json.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("invalid child"));
    }

    #[test]
    fn test_rejects_out_of_range_feature() {
        let json = REGRESSOR_JSON.replace("\"feature\": [4, -2, -2]", "\"feature\": [9, -2, -2]");
        let err = ForestRegressor::from_slice(json.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("invalid feature"));
    }

    #[test]
    fn test_rejects_wrong_leaf_width() {
        let json = CLASSIFIER_JSON.replace("[9.0, 1.0]", "[9.0]");
        assert!(ForestClassifier::from_slice(json.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_empty_forest() {
        let json = r#"{"kind": "regressor", "n_features": 5, "trees": []}"#;
        assert!(ForestRegressor::from_slice(json.as_bytes()).is_err());
    }
}
