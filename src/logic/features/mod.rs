//! Features Module - Feature Vector Builder
//!
//! Turns the form's raw inputs into the fixed-schema record the predictor
//! and explainer were fitted on.

pub mod category;
pub mod input;
pub mod layout;
pub mod vector;


// Re-export common types
pub use category::{CategoricalField, FLAT_TYPE, STOREY_RANGE};
pub use input::{NumericDomain, RawInput, YearDomain, NUMERIC_DOMAINS, TRANSACTION_YEAR_DOMAIN};
pub use layout::{diff_columns, layout_hash, ColumnMismatch, LayoutInfo, FEATURE_LAYOUT};
pub use vector::{BuiltRecord, CategoryFallback, FeatureRecord, FeatureVectorBuilder, NamedValue};
