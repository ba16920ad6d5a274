//! Logic Module - Feature assembly, inference and attribution
//!
//! - `features/` - raw form input to fixed-schema feature record
//! - `model/` - artifacts, predictor backends, feature tables
//! - `explain/` - explainer backends and waterfall data
//! - `pipeline` - one interaction: submit, then optionally explain

pub mod explain;
pub mod features;
pub mod model;
pub mod pipeline;
