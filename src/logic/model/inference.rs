//! Inference Engine - Predictor seam and prediction bookkeeping
//!
//! The predictor is an opaque artifact. Everything that can go wrong at
//! prediction time is structural (width or column drift), never transient.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::logic::features::{diff_columns, FeatureRecord};
use super::table::FeatureTable;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("predictor expects {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("schema drift at column {index}: predictor expects `{expected}`, input has `{actual}`")]
    SchemaDrift {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("predictor returned {actual} outputs for {expected} rows")]
    OutputShape { expected: usize, actual: usize },

    #[error("predictor backend failed: {0}")]
    Backend(String),
}

/// Check a table against what a model was fitted on: names first when known,
/// then width.
pub fn check_input_schema(
    feature_names: Option<&[String]>,
    n_features: usize,
    table: &FeatureTable,
) -> Result<(), InferenceError> {
    if let Some(names) = feature_names {
        if let Some(m) = diff_columns(names, table.columns()) {
            return Err(InferenceError::SchemaDrift {
                index: m.index,
                expected: m.expected,
                actual: m.actual,
            });
        }
    }

    if table.n_cols() != n_features {
        return Err(InferenceError::DimensionMismatch {
            expected: n_features,
            actual: table.n_cols(),
        });
    }

    Ok(())
}

// ============================================================================
// PREDICTOR TRAIT
// ============================================================================

/// Trait for predictor backends (tree ensemble, ONNX, ...)
pub trait Predictor: Send + Sync {
    /// Short backend name for status and logs
    fn kind(&self) -> &'static str;

    /// One output per table row, in row order
    fn predict_table(&self, table: &FeatureTable) -> Result<Vec<f64>, InferenceError>;
}

// ============================================================================
// PREDICTION RESULT
// ============================================================================

/// Prediction output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Estimated resale price; not clamped
    pub price: f64,
    pub inference_time_us: u64,
    /// Predictor kind that produced the price
    pub method: String,
}

/// Predict a single record
pub fn predict_record(
    predictor: &dyn Predictor,
    record: &FeatureRecord,
) -> Result<PredictionResult, InferenceError> {
    let start_time = Instant::now();

    let table = FeatureTable::from_record(record);
    let outputs = predictor.predict_table(&table)?;

    let price = match outputs.as_slice() {
        [price] => *price,
        other => {
            return Err(InferenceError::OutputShape {
                expected: 1,
                actual: other.len(),
            })
        }
    };

    Ok(PredictionResult {
        price,
        inference_time_us: start_time.elapsed().as_micros() as u64,
        method: predictor.kind().to_string(),
    })
}

// ============================================================================
// STATS
// ============================================================================

/// Latency counters, shared by request handlers
#[derive(Debug, Default)]
pub struct InferenceStats {
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
}

impl InferenceStats {
    pub fn record(&self, result: &PredictionResult) {
        self.latency_sum_us.fetch_add(result.inference_time_us, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.inference_count.load(Ordering::Relaxed)
    }

    pub fn avg_latency_ms(&self) -> f32 {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.count();
        if count > 0 {
            (sum as f32 / count as f32) / 1000.0
        } else {
            0.0
        }
    }
}
