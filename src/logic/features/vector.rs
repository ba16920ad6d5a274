//! Feature Record - Core data structure for model input
//!
//! **Versioned feature record with layout validation**
//!
//! Uses centralized layout from `layout.rs` for:
//! - Consistent column ordering
//! - Version tracking
//! - Layout hash for compatibility checks

use serde::{Deserialize, Serialize};

use super::category::{CategoricalField, CategoryMatch, FLAT_TYPE, STOREY_RANGE};
use super::input::RawInput;
use super::layout::{
    layout_hash, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION, FLAT_TYPE_OFFSET,
    STOREY_RANGE_OFFSET,
};

// ============================================================================
// VERSIONED FEATURE RECORD
// ============================================================================

/// One row of model input in `FEATURE_LAYOUT` order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout
    pub layout_hash: u32,
    /// Values in order defined by FEATURE_LAYOUT
    pub values: [f64; FEATURE_COUNT],
}

/// A named cell of a record, for rendering the record as a table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedValue {
    pub name: &'static str,
    pub value: f64,
}

impl FeatureRecord {
    /// Zeroed record stamped with the current layout
    pub fn new() -> Self {
        Self::from_values([0.0; FEATURE_COUNT])
    }

    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }

    /// Record as (name, value) pairs in column order
    pub fn named_values(&self) -> Vec<NamedValue> {
        FEATURE_LAYOUT
            .iter()
            .zip(self.values.iter())
            .map(|(&name, &value)| NamedValue { name, value })
            .collect()
    }

}

// Inspection helpers for tests
#[cfg(test)]
impl FeatureRecord {
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        super::layout::feature_index(name).and_then(|i| self.get(i))
    }

    pub fn column_names(&self) -> &'static [&'static str] {
        FEATURE_LAYOUT
    }

    /// Whether the stamp matches the layout this binary was built with
    pub fn is_compatible(&self) -> bool {
        super::layout::is_layout_compatible(self.version, self.layout_hash)
    }

    /// Bit-exact fingerprint of the values, used to compare records
    pub fn to_bits(&self) -> [u64; FEATURE_COUNT] {
        self.values.map(f64::to_bits)
    }
}

impl Default for FeatureRecord {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// A categorical field whose label was not recognized and fell back to baseline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryFallback {
    pub field: &'static str,
    pub label: String,
    pub encoded_as: &'static str,
}

/// Builder output: the record plus any baseline fallbacks that happened
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltRecord {
    pub record: FeatureRecord,
    pub fallbacks: Vec<CategoryFallback>,
}

/// Maps a [`RawInput`] to a [`FeatureRecord`].
///
/// Pure: no state, no randomness. Unknown category labels encode as the
/// field's baseline (all indicators 0) and are listed in `fallbacks`.
pub struct FeatureVectorBuilder;

impl FeatureVectorBuilder {
    /// Build the record only
    #[cfg(test)]
    pub fn build(input: &RawInput) -> FeatureRecord {
        Self::build_checked(input).record
    }

    /// Build the record and report baseline fallbacks
    pub fn build_checked(input: &RawInput) -> BuiltRecord {
        let mut values = [0.0f64; FEATURE_COUNT];

        values[0] = input.latitude;
        values[1] = input.longitude;
        values[2] = input.closest_mrt_dist;
        values[3] = input.cbd_dist;
        values[4] = input.floor_area_sqm;
        values[5] = f64::from(input.years_remaining);
        values[6] = f64::from(input.transaction_year);

        let mut fallbacks = Vec::new();
        let categorical: [(&CategoricalField, &str, usize); 2] = [
            (&FLAT_TYPE, input.flat_type.as_str(), FLAT_TYPE_OFFSET),
            (&STOREY_RANGE, input.storey_range.as_str(), STOREY_RANGE_OFFSET),
        ];

        for (field, label, offset) in categorical {
            let slots = &mut values[offset..offset + field.width()];
            if field.encode_into(label, slots) == CategoryMatch::Unrecognized {
                tracing::warn!(
                    field = field.name,
                    label,
                    baseline = field.baseline(),
                    "Unrecognized category label, encoding as baseline"
                );
                fallbacks.push(CategoryFallback {
                    field: field.name,
                    label: label.to_string(),
                    encoded_as: field.baseline(),
                });
            }
        }

        BuiltRecord {
            record: FeatureRecord::from_values(values),
            fallbacks,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
