//! ONNX Runtime predictor backend (`onnx` feature)
//!
//! Expects a regression graph with one float input of shape
//! `(batch, n_features)` and one float output with one value per row.

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

use super::inference::{InferenceError, Predictor};
use super::table::FeatureTable;

pub struct OnnxPredictor {
    // ONNX Runtime needs `&mut Session` to run
    session: Mutex<Session>,
    output_name: String,
}

impl OnnxPredictor {
    /// Build a session from model bytes already read by the loader
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self, String> {
        let session = Session::builder()
            .map_err(|e| format!("Failed to create session builder: {}", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| format!("Failed to set optimization: {}", e))?
            .commit_from_memory(model_bytes)
            .map_err(|e| format!("Failed to load model: {}", e))?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| "No output defined".to_string())?;

        Ok(Self {
            session: Mutex::new(session),
            output_name,
        })
    }
}

impl Predictor for OnnxPredictor {
    fn kind(&self) -> &'static str {
        "onnx"
    }

    fn predict_table(&self, table: &FeatureTable) -> Result<Vec<f64>, InferenceError> {
        let rows = table.n_rows();
        let input_array: Array2<f32> = table.values().mapv(|v| v as f32);

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| InferenceError::Backend(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError::Backend(format!("Inference failed: {}", e)))?;

        let output = outputs
            .get(&self.output_name)
            .ok_or_else(|| InferenceError::Backend("No output".to_string()))?;

        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Backend(format!("Extract error: {}", e)))?;

        if data.len() != rows {
            return Err(InferenceError::OutputShape {
                expected: rows,
                actual: data.len(),
            });
        }

        Ok(data.iter().map(|&v| f64::from(v)).collect())
    }
}
