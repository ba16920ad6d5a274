//! Model Module - Artifacts and inference
//!
//! The predictor is an opaque, swappable backend behind `Predictor`.
//! Tree ensembles are built in; ONNX Runtime sits behind the `onnx` feature.

pub mod artifacts;
pub mod inference;
pub mod table;
pub mod tree;

#[cfg(feature = "onnx")]
pub mod onnx;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export common types
pub use artifacts::{ArtifactMetadata, ArtifactPaths, ArtifactSource, ModelContext};
pub use inference::{predict_record, InferenceError, InferenceStats, PredictionResult};
pub use table::TableError;
