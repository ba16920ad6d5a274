//! Small artifacts over the real layout, shared by tests

use crate::logic::explain::engine::ExplainerAlgorithm;
use crate::logic::explain::{ExplainerFile, TreeShapExplainer};
use crate::logic::features::layout::FEATURE_COUNT;
use crate::logic::features::{FeatureRecord, FEATURE_LAYOUT};

use super::artifacts::ModelContext;
use super::table::{FeatureTable, ReferenceSample, ReferenceSampleFile};
use super::tree::{Tree, TreeEnsemble, TreeNode};

pub const FLOOR_AREA: usize = 4;
pub const TRANSACTION_YEAR: usize = 6;
pub const FOUR_ROOM: usize = 9;
pub const STOREY_11_TO_15: usize = 14;

fn split(feature: usize, threshold: f64, left: usize, right: usize) -> TreeNode {
    TreeNode::Split { feature, threshold, left, right, missing_go_left: true }
}

fn leaf(value: f64) -> TreeNode {
    TreeNode::Leaf { value }
}

/// Price model keyed on floor area, 4 ROOM, 11 TO 15 and transaction year
pub fn toy_ensemble() -> TreeEnsemble {
    TreeEnsemble {
        base_score: 300_000.0,
        n_features: FEATURE_COUNT,
        feature_names: Some(layout_columns()),
        trees: vec![
            Tree { nodes: vec![split(FLOOR_AREA, 90.0, 1, 2), leaf(-40_000.0), leaf(60_000.0)] },
            Tree {
                nodes: vec![
                    split(FOUR_ROOM, 0.5, 1, 2),
                    leaf(0.0),
                    split(STOREY_11_TO_15, 0.5, 3, 4),
                    leaf(15_000.0),
                    leaf(35_000.0),
                ],
            },
            Tree { nodes: vec![split(TRANSACTION_YEAR, 2012.5, 1, 2), leaf(-5_000.0), leaf(8_000.0)] },
        ],
    }
}

pub fn layout_columns() -> Vec<String> {
    FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect()
}

/// Deterministic layout-shaped rows
pub fn reference_rows(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| {
            let mut values = [0.0; FEATURE_COUNT];
            values[0] = 1.30 + 0.01 * i as f64;
            values[1] = 103.80;
            values[2] = 400.0 + 50.0 * i as f64;
            values[3] = 9_000.0;
            values[FLOOR_AREA] = 60.0 + 15.0 * i as f64;
            values[5] = 70.0;
            values[TRANSACTION_YEAR] = 2012.0 + (i % 3) as f64;
            values[FOUR_ROOM] = (i % 2) as f64;
            values[STOREY_11_TO_15] = (i % 3 == 0) as u8 as f64;
            values.to_vec()
        })
        .collect()
}

pub fn reference_sample(n: usize) -> ReferenceSample {
    ReferenceSample::new(FeatureTable::from_rows(layout_columns(), reference_rows(n)).unwrap())
}

pub fn explainer_file() -> ExplainerFile {
    ExplainerFile {
        algorithm: ExplainerAlgorithm::InterventionalTree,
        model: toy_ensemble(),
        background: reference_rows(6),
    }
}

pub fn reference_file(n: usize) -> ReferenceSampleFile {
    ReferenceSampleFile { columns: layout_columns(), rows: reference_rows(n) }
}

/// In-memory context with an `n`-row reference sample
pub fn toy_context(n: usize) -> ModelContext {
    let explainer = TreeShapExplainer::from_file(explainer_file()).unwrap();
    ModelContext::from_parts(Box::new(toy_ensemble()), Box::new(explainer), reference_sample(n))
}

/// Expected toy price for a record
pub fn toy_price(record: &FeatureRecord) -> f64 {
    toy_ensemble().predict_row(ndarray::ArrayView1::from(&record.values[..]))
}
