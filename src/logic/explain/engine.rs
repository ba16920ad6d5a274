use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use super::types::{AttributionResult, FeatureContribution};
use crate::logic::model::table::FeatureTable;
use crate::logic::model::tree::{goes_left, Tree, TreeEnsemble, TreeNode};
use crate::logic::model::InferenceError;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExplainError {
    #[error("explainer input rejected: {0}")]
    Input(#[from] InferenceError),

    #[error("explainer returned {len} rows, row {index} requested")]
    RowOutOfRange { index: usize, len: usize },
}

// ============================================================================
// EXPLAINER TRAIT
// ============================================================================

/// Batch attribution: one result per input row, in row order
pub trait Explainer: Send + Sync {
    fn kind(&self) -> &'static str;

    fn explain_table(&self, batch: &FeatureTable) -> Result<Vec<AttributionResult>, ExplainError>;
}

/// Take the attribution for row `index` out of a batch result.
///
/// The pipeline appends the user's row after the reference sample, so the
/// index it asks for is the reference sample's length.
pub fn attribution_at(
    mut results: Vec<AttributionResult>,
    index: usize,
) -> Result<AttributionResult, ExplainError> {
    let len = results.len();
    if index >= len {
        return Err(ExplainError::RowOutOfRange { index, len });
    }
    Ok(results.swap_remove(index))
}

// ============================================================================
// ARTIFACT FORMAT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplainerAlgorithm {
    InterventionalTree,
}

/// On-disk explainer: the ensemble it is bound to plus its background data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainerFile {
    pub algorithm: ExplainerAlgorithm,
    pub model: TreeEnsemble,
    pub background: Vec<Vec<f64>>,
}

// ============================================================================
// INTERVENTIONAL TREE SHAP
// ============================================================================

/// Exact Shapley values for a tree ensemble against a background sample.
///
/// For each background row `r`, every tree is walked with the explained row
/// `x`. Where the two disagree on a split whose feature is not yet pinned,
/// the walk forks: one branch pins the feature to `x`, the other to `r`.
/// A leaf reached with `a` features pinned to `x` and `b` pinned to `r`
/// credits each `x` feature `v·(a-1)!b!/(a+b)!` and debits each `r` feature
/// `v·a!(b-1)!/(a+b)!`. Averaging over `r` gives values that sum to
/// `f(x) - mean(f(background))`.
#[derive(Debug, Clone)]
pub struct TreeShapExplainer {
    model: TreeEnsemble,
    background: Array2<f64>,
    base_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pinned {
    Free,
    ToX,
    ToR,
}

impl TreeShapExplainer {
    pub fn new(model: TreeEnsemble, background: Vec<Vec<f64>>) -> Result<Self, String> {
        model.validate()?;

        if background.is_empty() {
            return Err("explainer background is empty".to_string());
        }

        let width = model.n_features;
        let mut flat = Vec::with_capacity(background.len() * width);
        for (i, row) in background.iter().enumerate() {
            if row.len() != width {
                return Err(format!("background row {i} has {} values, expected {width}", row.len()));
            }
            flat.extend_from_slice(row);
        }

        let background = Array2::from_shape_vec((background.len(), width), flat)
            .map_err(|e| format!("background shape: {e}"))?;

        let base_value = background
            .rows()
            .into_iter()
            .map(|row| model.predict_row(row))
            .sum::<f64>()
            / background.nrows() as f64;

        Ok(Self {
            model,
            background,
            base_value,
        })
    }

    pub fn from_file(file: ExplainerFile) -> Result<Self, String> {
        match file.algorithm {
            ExplainerAlgorithm::InterventionalTree => Self::new(file.model, file.background),
        }
    }

    /// Mean model output over the background
    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    pub fn background_len(&self) -> usize {
        self.background.nrows()
    }

    /// Shapley values for one row, in column order
    pub fn shap_values(&self, x: ArrayView1<'_, f64>) -> Vec<f64> {
        let n = self.model.n_features;
        let mut phi = vec![0.0; n];
        let mut pinned = vec![Pinned::Free; n];

        for r in self.background.rows() {
            for tree in &self.model.trees {
                walk(tree, 0, x, r, &mut pinned, 0, 0, &mut phi);
            }
        }

        let count = self.background.nrows() as f64;
        phi.iter_mut().for_each(|v| *v /= count);
        phi
    }
}

impl Explainer for TreeShapExplainer {
    fn kind(&self) -> &'static str {
        "interventional_tree"
    }

    fn explain_table(&self, batch: &FeatureTable) -> Result<Vec<AttributionResult>, ExplainError> {
        self.model.check_input(batch)?;

        let results = batch
            .rows()
            .map(|x| {
                let phi = self.shap_values(x);
                let contributions = batch
                    .columns()
                    .iter()
                    .zip(x.iter())
                    .zip(phi)
                    .map(|((name, &feature_value), contribution)| FeatureContribution {
                        name: name.clone(),
                        feature_value,
                        contribution,
                    })
                    .collect();

                AttributionResult {
                    base_value: self.base_value,
                    contributions,
                }
            })
            .collect();

        Ok(results)
    }
}

/// `a! b! / (a + b + 1)!`
fn shapley_weight(a: usize, b: usize) -> f64 {
    let n = a + b;
    // C(n, a) built up incrementally to stay in range
    let mut binom = 1.0f64;
    for i in 0..a.min(b) {
        binom = binom * (n - i) as f64 / (i + 1) as f64;
    }
    1.0 / ((n + 1) as f64 * binom)
}

#[allow(clippy::too_many_arguments)]
fn walk(
    tree: &Tree,
    idx: usize,
    x: ArrayView1<'_, f64>,
    r: ArrayView1<'_, f64>,
    pinned: &mut [Pinned],
    n_x: usize,
    n_r: usize,
    phi: &mut [f64],
) {
    match tree.nodes[idx] {
        TreeNode::Leaf { value } => {
            if n_x + n_r == 0 {
                return;
            }
            let credit = if n_x > 0 { value * shapley_weight(n_x - 1, n_r) } else { 0.0 };
            let debit = if n_r > 0 { value * shapley_weight(n_x, n_r - 1) } else { 0.0 };

            for (slot, side) in phi.iter_mut().zip(pinned.iter()) {
                match side {
                    Pinned::ToX => *slot += credit,
                    Pinned::ToR => *slot -= debit,
                    Pinned::Free => {}
                }
            }
        }
        TreeNode::Split { feature, threshold, left, right, missing_go_left } => {
            let child = |v: f64| if goes_left(v, threshold, missing_go_left) { left } else { right };
            let x_child = child(x[feature]);
            let r_child = child(r[feature]);

            let side = pinned[feature];
            match side {
                Pinned::ToX => walk(tree, x_child, x, r, pinned, n_x, n_r, phi),
                Pinned::ToR => walk(tree, r_child, x, r, pinned, n_x, n_r, phi),
                Pinned::Free if x_child == r_child => {
                    walk(tree, x_child, x, r, pinned, n_x, n_r, phi)
                }
                Pinned::Free => {
                    pinned[feature] = Pinned::ToX;
                    walk(tree, x_child, x, r, pinned, n_x + 1, n_r, phi);
                    pinned[feature] = Pinned::ToR;
                    walk(tree, r_child, x, r, pinned, n_x, n_r + 1, phi);
                    pinned[feature] = Pinned::Free;
                }
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
