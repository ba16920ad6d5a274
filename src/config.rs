//! Configuration module

use std::env;

use crate::constants::{
    DEFAULT_EXPLAINER_PATH, DEFAULT_HOST, DEFAULT_MODEL_PATH, DEFAULT_PORT,
    DEFAULT_REFERENCE_SAMPLE_PATH, DEFAULT_WATERFALL_MAX_DISPLAY,
};
use crate::logic::model::{ArtifactPaths, ArtifactSource};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    pub model_path: String,
    pub explainer_path: String,
    pub reference_sample_path: String,

    /// Expected SHA-256 digests; unset means not checked
    pub model_sha256: Option<String>,
    pub explainer_sha256: Option<String>,
    pub reference_sample_sha256: Option<String>,

    /// Waterfall bars when the request does not say
    pub waterfall_max_display: usize,

    /// Environment (development, production)
    pub environment: String,

    /// JSON log lines instead of human-readable ones
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: non_empty("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),

            port: non_empty("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),

            model_path: non_empty("MODEL_PATH").unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string()),

            explainer_path: non_empty("EXPLAINER_PATH")
                .unwrap_or_else(|| DEFAULT_EXPLAINER_PATH.to_string()),

            reference_sample_path: non_empty("REFERENCE_SAMPLE_PATH")
                .unwrap_or_else(|| DEFAULT_REFERENCE_SAMPLE_PATH.to_string()),

            model_sha256: non_empty("MODEL_SHA256"),
            explainer_sha256: non_empty("EXPLAINER_SHA256"),
            reference_sample_sha256: non_empty("REFERENCE_SAMPLE_SHA256"),

            waterfall_max_display: non_empty("WATERFALL_MAX_DISPLAY")
                .and_then(|n| n.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_WATERFALL_MAX_DISPLAY),

            environment: non_empty("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),

            log_json: non_empty("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            model: ArtifactSource::new(&self.model_path).with_sha256(self.model_sha256.clone()),
            explainer: ArtifactSource::new(&self.explainer_path)
                .with_sha256(self.explainer_sha256.clone()),
            reference_sample: ArtifactSource::new(&self.reference_sample_path)
                .with_sha256(self.reference_sample_sha256.clone()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Production always logs JSON
    pub fn json_logs(&self) -> bool {
        self.log_json || self.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.model_path, DEFAULT_MODEL_PATH);
        assert_eq!(config.model_sha256, None);
        assert_eq!(config.waterfall_max_display, DEFAULT_WATERFALL_MAX_DISPLAY);
        assert!(!config.is_production());
        assert!(!config.json_logs());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("PORT", "9000"),
            ("MODEL_PATH", "/srv/model.onnx"),
            ("EXPLAINER_SHA256", "abc123"),
            ("WATERFALL_MAX_DISPLAY", "8"),
            ("ENVIRONMENT", "production"),
            ("LOG_FORMAT", "JSON"),
        ]);

        assert_eq!(config.port, 9000);
        assert_eq!(config.waterfall_max_display, 8);
        assert!(config.is_production());
        assert!(config.log_json);
        assert!(config.json_logs());

        let staging = self::config(&[("LOG_FORMAT", "json")]);
        assert!(!staging.is_production());
        assert!(staging.json_logs());

        let paths = config.artifact_paths();
        assert_eq!(paths.model.path, std::path::PathBuf::from("/srv/model.onnx"));
        assert_eq!(paths.explainer.expected_sha256.as_deref(), Some("abc123"));
        assert_eq!(paths.reference_sample.expected_sha256, None);
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = config(&[("PORT", "eighty"), ("WATERFALL_MAX_DISPLAY", "0"), ("MODEL_SHA256", " ")]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.waterfall_max_display, DEFAULT_WATERFALL_MAX_DISPLAY);
        assert_eq!(config.model_sha256, None);
    }
}
