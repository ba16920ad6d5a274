//! Feature Layout - Centralized Feature Definition
//!
//! **CRITICAL: This file controls the feature schema**
//!
//! The predictor and explainer artifacts were fitted against exactly this
//! column list. A mismatch does not fail loudly inside a tree model, it just
//! produces a nonsense price.
//!
//! ## Rules (NEVER break these):
//! 1. Add column → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove column → increment FEATURE_VERSION

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Column names in exact training order
pub const FEATURE_LAYOUT: &[&str] = &[
    // === Scalars (0-6) ===
    "latitude",                      // 0
    "longitude",                     // 1
    "closest_mrt_dist",              // 2: metres to nearest MRT station
    "cbd_dist",                      // 3: metres to the CBD
    "floor_area_sqm",                // 4
    "years_remaining",               // 5: lease years left
    "transaction_year",              // 6

    // === Flat type indicators (7-12), baseline "1 ROOM" ===
    "flat_type_2 ROOM",              // 7
    "flat_type_3 ROOM",              // 8
    "flat_type_4 ROOM",              // 9
    "flat_type_5 ROOM",              // 10
    "flat_type_EXECUTIVE",           // 11
    "flat_type_MULTI-GENERATION",    // 12

    // === Storey range indicators (13-19), baseline "01 TO 05" ===
    "storey_range_binned_06 TO 10",  // 13
    "storey_range_binned_11 TO 15",  // 14
    "storey_range_binned_16 TO 20",  // 15
    "storey_range_binned_21 TO 25",  // 16
    "storey_range_binned_26 TO 30",  // 17
    "storey_range_binned_31 TO 35",  // 18
    "storey_range_binned_36 TO 40",  // 19
];

/// Total number of columns
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 20;

/// Number of scalar (non-indicator) columns at the head of the layout
pub const SCALAR_COUNT: usize = 7;

/// Index of the first flat type indicator
pub const FLAT_TYPE_OFFSET: usize = SCALAR_COUNT;

/// Index of the first storey range indicator
pub const STOREY_RANGE_OFFSET: usize = FLAT_TYPE_OFFSET + 6;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of the feature layout
pub fn compute_layout_hash() -> u32 {
    hash_columns(FEATURE_VERSION, FEATURE_LAYOUT.iter().copied())
}

/// Hash an arbitrary ordered column list the same way as the layout
pub fn hash_columns<'a>(version: u8, columns: impl IntoIterator<Item = &'a str>) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[version]);

    for name in columns {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

/// Get layout hash
pub fn layout_hash() -> u32 {
    compute_layout_hash()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for the schema endpoint and logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// A column list that does not line up with the layout
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("column {index}: expected `{expected}`, found `{actual}`")]
pub struct ColumnMismatch {
    pub index: usize,
    pub expected: String,
    pub actual: String,
}

/// Compare a column list against an expected one, reporting the first difference.
///
/// A length difference is reported at the first index past the shorter list,
/// with `<missing>` standing in for the absent name.
pub fn diff_columns<A, B>(expected: &[A], actual: &[B]) -> Option<ColumnMismatch>
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let len = expected.len().max(actual.len());

    (0..len).find_map(|index| {
        let e = expected.get(index).map(AsRef::as_ref);
        let a = actual.get(index).map(AsRef::as_ref);

        if e == a {
            return None;
        }

        Some(ColumnMismatch {
            index,
            expected: e.unwrap_or("<missing>").to_string(),
            actual: a.unwrap_or("<missing>").to_string(),
        })
    })
}

/// Check if a (version, hash) stamp is compatible with the current layout
#[cfg(test)]
pub fn is_layout_compatible(version: u8, hash: u32) -> bool {
    version == FEATURE_VERSION && hash == layout_hash()
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature index by name (O(n) but features are few)
#[cfg(test)]
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

// ============================================================================
// TESTS
// ============================================================================
