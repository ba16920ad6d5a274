//! Tree Ensemble - JSON gradient-boosted regression trees
//!
//! Output is `base_score + Σ leaf(tree, row)`; any learning rate is already
//! folded into leaf values by the exporter. A row goes left when
//! `value <= threshold`, NaN follows `missing_go_left`.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use super::inference::{check_input_schema, InferenceError, Predictor};
use super::table::FeatureTable;

fn default_true() -> bool {
    true
}

/// Split rule shared by prediction and attribution
#[inline]
pub fn goes_left(value: f64, threshold: f64, missing_go_left: bool) -> bool {
    if value.is_nan() {
        missing_go_left
    } else {
        value <= threshold
    }
}

/// One node of a regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default = "default_true")]
        missing_go_left: bool,
    },
    Leaf {
        value: f64,
    },
}

/// A single regression tree; node 0 is the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    /// Leaf value reached by `row`
    pub fn predict(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split { feature, threshold, left, right, missing_go_left } => {
                    idx = if goes_left(row[feature], threshold, missing_go_left) { left } else { right };
                }
            }
        }
    }

    /// Structural checks: non-empty, children in range and strictly after
    /// their parent (so every walk terminates), split features in range.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split { feature, threshold, left, right, .. } = *node {
                if feature >= n_features {
                    return Err(format!("node {i}: feature {feature} >= n_features {n_features}"));
                }
                if threshold.is_nan() {
                    return Err(format!("node {i}: threshold is NaN"));
                }
                for child in [left, right] {
                    if child <= i || child >= self.nodes.len() {
                        return Err(format!("node {i}: child {child} out of range"));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Additive ensemble of regression trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub base_score: f64,
    pub n_features: usize,
    /// Column names the ensemble was fitted on, if the exporter kept them
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub trees: Vec<Tree>,
}

impl TreeEnsemble {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(names) = &self.feature_names {
            if names.len() != self.n_features {
                return Err(format!(
                    "{} feature names for n_features {}",
                    names.len(),
                    self.n_features
                ));
            }
        }

        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features).map_err(|e| format!("tree {t}: {e}"))?;
        }

        Ok(())
    }

    /// Model output for one row (width already checked)
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.base_score + self.trees.iter().map(|tree| tree.predict(row)).sum::<f64>()
    }

    pub fn check_input(&self, table: &FeatureTable) -> Result<(), InferenceError> {
        check_input_schema(self.feature_names.as_deref(), self.n_features, table)
    }
}

impl Predictor for TreeEnsemble {
    fn kind(&self) -> &'static str {
        "tree_ensemble"
    }

    fn predict_table(&self, table: &FeatureTable) -> Result<Vec<f64>, InferenceError> {
        self.check_input(table)?;
        Ok(table.rows().map(|row| self.predict_row(row)).collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ndarray::array;

    /// x0 <= 0.5 → 1.0, else 3.0
    pub(crate) fn stump() -> Tree {
        Tree {
            nodes: vec![
                TreeNode::Split { feature: 0, threshold: 0.5, left: 1, right: 2, missing_go_left: true },
                TreeNode::Leaf { value: 1.0 },
                TreeNode::Leaf { value: 3.0 },
            ],
        }
    }

    fn table(columns: &[&str], rows: Vec<Vec<f64>>) -> FeatureTable {
        FeatureTable::from_rows(columns.iter().map(|s| s.to_string()).collect(), rows).unwrap()
    }

    #[test]
    fn test_parse_nodes() {
        let json = r#"{
            "base_score": 10.0,
            "n_features": 2,
            "trees": [{ "nodes": [
                { "feature": 1, "threshold": 2.0, "left": 1, "right": 2 },
                { "value": -1.0 },
                { "value": 1.0 }
            ]}]
        }"#;
        let model: TreeEnsemble = serde_json::from_str(json).unwrap();

        assert!(model.validate().is_ok());
        assert_eq!(model.feature_names, None);
        assert_eq!(
            model.trees[0].nodes[0],
            TreeNode::Split { feature: 1, threshold: 2.0, left: 1, right: 2, missing_go_left: true }
        );
        assert_eq!(model.trees[0].nodes[1], TreeNode::Leaf { value: -1.0 });
    }

    #[test]
    fn test_threshold_goes_left() {
        let tree = stump();
        assert_eq!(tree.predict(array![0.5].view()), 1.0);
        assert_eq!(tree.predict(array![0.500001].view()), 3.0);
        assert_eq!(tree.predict(array![-7.0].view()), 1.0);
    }

    #[test]
    fn test_nan_follows_missing_direction() {
        let mut tree = stump();
        assert_eq!(tree.predict(array![f64::NAN].view()), 1.0);

        if let TreeNode::Split { missing_go_left, .. } = &mut tree.nodes[0] {
            *missing_go_left = false;
        }
        assert_eq!(tree.predict(array![f64::NAN].view()), 3.0);
    }

    #[test]
    fn test_ensemble_sums_trees() {
        let model = TreeEnsemble {
            base_score: 100.0,
            n_features: 1,
            feature_names: None,
            trees: vec![stump(), stump()],
        };
        let out = model.predict_table(&table(&["x"], vec![vec![0.0], vec![1.0]])).unwrap();
        assert_eq!(out, vec![102.0, 106.0]);
    }

    #[test]
    fn test_width_mismatch() {
        let model = TreeEnsemble { base_score: 0.0, n_features: 2, feature_names: None, trees: vec![stump()] };
        let err = model.predict_table(&table(&["x"], vec![vec![0.0]])).unwrap_err();
        assert_eq!(err, InferenceError::DimensionMismatch { expected: 2, actual: 1 });
    }

    #[test]
    fn test_schema_drift_by_name() {
        let model = TreeEnsemble {
            base_score: 0.0,
            n_features: 2,
            feature_names: Some(vec!["a".into(), "b".into()]),
            trees: vec![stump()],
        };
        let err = model.predict_table(&table(&["b", "a"], vec![vec![0.0, 0.0]])).unwrap_err();
        assert!(matches!(err, InferenceError::SchemaDrift { index: 0, .. }));
    }

    #[test]
    fn test_validate_rejects_bad_structure() {
        let backwards = Tree {
            nodes: vec![
                TreeNode::Split { feature: 0, threshold: 0.0, left: 0, right: 1, missing_go_left: true },
                TreeNode::Leaf { value: 0.0 },
            ],
        };
        assert!(backwards.validate(1).is_err());

        let dangling = Tree {
            nodes: vec![TreeNode::Split { feature: 0, threshold: 0.0, left: 1, right: 5, missing_go_left: true }],
        };
        assert!(dangling.validate(1).is_err());

        assert!(stump().validate(0).is_err());
        assert!(Tree { nodes: vec![] }.validate(1).is_err());
    }
}
