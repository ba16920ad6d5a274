//! Categorical Fields - Label to indicator encoding
//!
//! Each categorical field owns an ordered label list. The first label is the
//! baseline and has no column; every other label maps to one indicator column.
//! A label outside the list encodes like the baseline (all zeros) and is
//! reported as [`CategoryMatch::Unrecognized`] so callers can flag it.

use serde::Serialize;

// ============================================================================
// FIELD DEFINITION
// ============================================================================

/// A one-hot encoded categorical field
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CategoricalField {
    /// Field name as it appears in the raw input
    pub name: &'static str,
    /// Form label and help text
    pub label: &'static str,
    pub help: &'static str,
    /// Column name prefix for indicator columns
    pub prefix: &'static str,
    /// All labels; index 0 is the baseline
    pub labels: &'static [&'static str],
}

/// Outcome of resolving a raw label against a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryMatch {
    /// Label has its own indicator column at this offset within the field
    Indicator(usize),
    /// Label is the baseline; all indicators stay 0
    Baseline,
    /// Label is not part of the field; encoded as the baseline
    Unrecognized,
}

impl CategoricalField {
    /// The implicit baseline label
    pub fn baseline(&self) -> &'static str {
        self.labels[0]
    }

    /// Labels that get an indicator column, in column order
    pub fn indicator_labels(&self) -> &'static [&'static str] {
        &self.labels[1..]
    }

    /// Number of indicator columns
    pub fn width(&self) -> usize {
        self.labels.len() - 1
    }

    /// Resolve a raw label. Comparison is exact.
    pub fn resolve(&self, label: &str) -> CategoryMatch {
        if label == self.baseline() {
            return CategoryMatch::Baseline;
        }

        match self.indicator_labels().iter().position(|&l| l == label) {
            Some(offset) => CategoryMatch::Indicator(offset),
            None => CategoryMatch::Unrecognized,
        }
    }

    /// Write the indicators for `label` into `out` (length must equal `width()`).
    ///
    /// Every slot is overwritten, so stale values never leak through.
    pub fn encode_into(&self, label: &str, out: &mut [f64]) -> CategoryMatch {
        debug_assert_eq!(out.len(), self.width());

        let resolved = self.resolve(label);
        for (offset, slot) in out.iter_mut().enumerate() {
            *slot = if resolved == CategoryMatch::Indicator(offset) { 1.0 } else { 0.0 };
        }
        resolved
    }

}

#[cfg(test)]
impl CategoricalField {
    /// Indicator column names, e.g. `flat_type_2 ROOM`
    pub fn column_names(&self) -> Vec<String> {
        self.indicator_labels()
            .iter()
            .map(|label| format!("{}{}", self.prefix, label))
            .collect()
    }

    /// Indicator vector for `label`
    pub fn encode(&self, label: &str) -> Vec<f64> {
        let mut out = vec![0.0; self.width()];
        self.encode_into(label, &mut out);
        out
    }
}

// ============================================================================
// FIELDS
// ============================================================================

/// Flat type, baseline "1 ROOM"
pub const FLAT_TYPE: CategoricalField = CategoricalField {
    name: "flat_type",
    label: "Flat Type",
    help: "Flat Type of the HDB flat",
    prefix: "flat_type_",
    labels: &[
        "1 ROOM",
        "2 ROOM",
        "3 ROOM",
        "4 ROOM",
        "5 ROOM",
        "EXECUTIVE",
        "MULTI-GENERATION",
    ],
};

/// Storey range, baseline "01 TO 05"
pub const STOREY_RANGE: CategoricalField = CategoricalField {
    name: "storey_range",
    label: "Storey Range",
    help: "The floor of the flat",
    prefix: "storey_range_binned_",
    labels: &[
        "01 TO 05",
        "06 TO 10",
        "11 TO 15",
        "16 TO 20",
        "21 TO 25",
        "26 TO 30",
        "31 TO 35",
        "36 TO 40",
    ],
};

/// Transaction years the model was trained on
pub const TRANSACTION_YEARS: &[u16] = &[2012, 2013, 2014];

// ============================================================================
// TESTS
// ============================================================================
