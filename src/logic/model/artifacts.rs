//! Artifact Loader - predictor, explainer and reference sample
//!
//! Each artifact is read from disk exactly once, digested and parsed.
//! Any failure here is fatal for the process; there is no partial mode.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::inference::Predictor;
use super::table::{ReferenceSample, ReferenceSampleFile};
use super::tree::TreeEnsemble;
use crate::logic::explain::{Explainer, ExplainerFile, TreeShapExplainer};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("corrupt artifact {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("unsupported predictor format: {0}")]
    UnsupportedFormat(PathBuf),

    #[cfg(feature = "onnx")]
    #[error("failed to load ONNX model {path}: {reason}")]
    Onnx { path: PathBuf, reason: String },
}

// ============================================================================
// SOURCES & METADATA
// ============================================================================

/// Where one artifact lives and, optionally, the SHA-256 it must have
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactSource {
    pub path: PathBuf,
    pub expected_sha256: Option<String>,
}

impl ArtifactSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), expected_sha256: None }
    }

    pub fn with_sha256(mut self, sha256: Option<String>) -> Self {
        self.expected_sha256 = sha256;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPaths {
    pub model: ArtifactSource,
    pub explainer: ArtifactSource,
    pub reference_sample: ArtifactSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactMetadata {
    pub kind: &'static str,
    pub path: String,
    pub sha256: String,
    pub size_bytes: usize,
    pub loaded_at: DateTime<Utc>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// The single disk read for an artifact, with digest and optional check
fn read_artifact(
    kind: &'static str,
    source: &ArtifactSource,
) -> Result<(Vec<u8>, ArtifactMetadata), ArtifactError> {
    let path = &source.path;
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ArtifactError::NotFound(path.clone()),
        _ => ArtifactError::Io { path: path.clone(), source: e },
    })?;

    let sha256 = sha256_hex(&bytes);
    if let Some(expected) = &source.expected_sha256 {
        if !expected.trim().eq_ignore_ascii_case(&sha256) {
            return Err(ArtifactError::ChecksumMismatch {
                path: path.clone(),
                expected: expected.clone(),
                actual: sha256,
            });
        }
    }

    tracing::info!(
        kind,
        path = %path.display(),
        size = bytes.len(),
        sha256 = &sha256[..12],
        "Artifact read"
    );

    let metadata = ArtifactMetadata {
        kind,
        path: path.display().to_string(),
        sha256,
        size_bytes: bytes.len(),
        loaded_at: Utc::now(),
    };

    Ok((bytes, metadata))
}

fn parse_json<T: serde::de::DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T, ArtifactError> {
    serde_json::from_slice(bytes).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn corrupt(path: &Path, reason: impl ToString) -> ArtifactError {
    ArtifactError::Corrupt {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

// ============================================================================
// LOADERS
// ============================================================================

/// Predictor backend is chosen by file extension
pub fn load_predictor(source: &ArtifactSource) -> Result<(Box<dyn Predictor>, ArtifactMetadata), ArtifactError> {
    let path = &source.path;
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("json") => {
            let (bytes, metadata) = read_artifact("predictor", source)?;
            let model: TreeEnsemble = parse_json(path, &bytes)?;
            model.validate().map_err(|e| corrupt(path, e))?;

            tracing::info!(trees = model.trees.len(), n_features = model.n_features, "Tree ensemble loaded");
            Ok((Box::new(model), metadata))
        }
        #[cfg(feature = "onnx")]
        Some("onnx") => {
            let (bytes, metadata) = read_artifact("predictor", source)?;
            let predictor = super::onnx::OnnxPredictor::from_bytes(&bytes).map_err(|reason| {
                ArtifactError::Onnx { path: path.clone(), reason }
            })?;

            tracing::info!("ONNX predictor loaded");
            Ok((Box::new(predictor), metadata))
        }
        _ => Err(ArtifactError::UnsupportedFormat(path.clone())),
    }
}

pub fn load_explainer(source: &ArtifactSource) -> Result<(Box<dyn Explainer>, ArtifactMetadata), ArtifactError> {
    let (bytes, metadata) = read_artifact("explainer", source)?;
    let file: ExplainerFile = parse_json(&source.path, &bytes)?;
    let explainer = TreeShapExplainer::from_file(file).map_err(|e| corrupt(&source.path, e))?;

    tracing::info!(
        background_rows = explainer.background_len(),
        base_value = explainer.base_value(),
        "Explainer loaded"
    );
    Ok((Box::new(explainer), metadata))
}

pub fn load_reference_sample(source: &ArtifactSource) -> Result<(ReferenceSample, ArtifactMetadata), ArtifactError> {
    let (bytes, metadata) = read_artifact("reference_sample", source)?;
    let file: ReferenceSampleFile = parse_json(&source.path, &bytes)?;
    let sample = ReferenceSample::from_file(file).map_err(|e| corrupt(&source.path, e))?;

    tracing::info!(rows = sample.len(), "Reference sample loaded");
    Ok((sample, metadata))
}

// ============================================================================
// MODEL CONTEXT
// ============================================================================

/// Everything an interaction needs, loaded once and then read-only
pub struct ModelContext {
    pub predictor: Box<dyn Predictor>,
    pub explainer: Box<dyn Explainer>,
    pub reference: ReferenceSample,
    pub artifacts: Vec<ArtifactMetadata>,
}

impl ModelContext {
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        let (predictor, model_meta) = load_predictor(&paths.model)?;
        let (explainer, explainer_meta) = load_explainer(&paths.explainer)?;
        let (reference, reference_meta) = load_reference_sample(&paths.reference_sample)?;

        Ok(Self {
            predictor,
            explainer,
            reference,
            artifacts: vec![model_meta, explainer_meta, reference_meta],
        })
    }

    /// Context from already-built parts, without artifact metadata
    #[cfg(test)]
    pub fn from_parts(
        predictor: Box<dyn Predictor>,
        explainer: Box<dyn Explainer>,
        reference: ReferenceSample,
    ) -> Self {
        Self {
            predictor,
            explainer,
            reference,
            artifacts: Vec::new(),
        }
    }
}

impl std::fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelContext")
            .field("predictor", &self.predictor.kind())
            .field("explainer", &self.explainer.kind())
            .field("reference_rows", &self.reference.len())
            .field("artifacts", &self.artifacts)
            .finish()
    }
}
