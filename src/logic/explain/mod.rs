//! Explain Module - Per-feature attribution of a single prediction
//!
//! - `engine` - explainer seam and interventional TreeSHAP
//! - `types` - attribution results
//! - `waterfall` - rendering data for one attribution

pub mod engine;
pub mod types;
pub mod waterfall;

pub use engine::{attribution_at, ExplainError, Explainer, ExplainerFile, TreeShapExplainer};
pub use types::{AttributionResult, FeatureContribution};
pub use waterfall::Waterfall;
