//! Feature Tables - Named columns over a dense row-major matrix
//!
//! Used for the single-row predictor input, the reference sample and the
//! extended batch handed to the explainer.

use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::logic::features::{diff_columns, ColumnMismatch, FeatureRecord, FEATURE_LAYOUT};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    #[error("row {row} has {actual} values, expected {expected}")]
    RaggedRow { row: usize, expected: usize, actual: usize },

    #[error("record columns do not line up with table: {0}")]
    ColumnMismatch(#[from] ColumnMismatch),
}

// ============================================================================
// FEATURE TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl FeatureTable {
    /// Build from column names and rows; every row must be `columns.len()` wide
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, TableError> {
        let width = columns.len();
        let mut flat = Vec::with_capacity(rows.len() * width);

        for (row, values) in rows.iter().enumerate() {
            if values.len() != width {
                return Err(TableError::RaggedRow {
                    row,
                    expected: width,
                    actual: values.len(),
                });
            }
            flat.extend_from_slice(values);
        }

        let values = Array2::from_shape_vec((rows.len(), width), flat).map_err(|_| {
            TableError::RaggedRow { row: 0, expected: width, actual: 0 }
        })?;

        Ok(Self { columns, values })
    }

    /// Single-row table in layout order
    pub fn from_record(record: &FeatureRecord) -> Self {
        let values = Array2::from_shape_fn((1, record.values.len()), |(_, j)| record.values[j]);
        Self {
            columns: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
            values,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[cfg(any(test, feature = "onnx"))]
    pub fn values(&self) -> ndarray::ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    #[cfg(test)]
    pub fn row(&self, index: usize) -> Option<ArrayView1<'_, f64>> {
        (index < self.n_rows()).then(|| self.values.row(index))
    }

    pub fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, f64>> {
        self.values.axis_iter(Axis(0))
    }

    /// A copy of this table with `record` appended as the last row.
    ///
    /// `self` is never modified. The table's columns must be exactly the
    /// layout, otherwise the record's values would land under the wrong names.
    pub fn with_record_appended(&self, record: &FeatureRecord) -> Result<FeatureTable, TableError> {
        if let Some(mismatch) = diff_columns(self.columns.as_slice(), FEATURE_LAYOUT) {
            return Err(TableError::ColumnMismatch(mismatch));
        }

        let mut extended = self.values.clone();
        extended
            .push_row(ArrayView1::from(&record.values[..]))
            .map_err(|_| TableError::RaggedRow {
                row: self.n_rows(),
                expected: self.n_cols(),
                actual: record.values.len(),
            })?;

        Ok(FeatureTable {
            columns: self.columns.clone(),
            values: extended,
        })
    }
}

// ============================================================================
// REFERENCE SAMPLE
// ============================================================================

/// On-disk form of the reference sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceSampleFile {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

/// Immutable background batch, loaded once
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSample {
    table: FeatureTable,
}

impl ReferenceSample {
    pub fn new(table: FeatureTable) -> Self {
        Self { table }
    }

    pub fn from_file(file: ReferenceSampleFile) -> Result<Self, TableError> {
        FeatureTable::from_rows(file.columns, file.rows).map(Self::new)
    }

    /// Number of rows; also the index the appended user row lands at
    pub fn len(&self) -> usize {
        self.table.n_rows()
    }

    #[cfg(test)]
    pub fn table(&self) -> &FeatureTable {
        &self.table
    }

    /// Private working copy with `record` as the last row
    pub fn extended_with(&self, record: &FeatureRecord) -> Result<FeatureTable, TableError> {
        self.table.with_record_appended(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::layout::FEATURE_COUNT;

    fn layout_columns() -> Vec<String> {
        FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect()
    }

    fn sample(rows: usize) -> ReferenceSample {
        let data = (0..rows).map(|i| vec![i as f64; FEATURE_COUNT]).collect();
        ReferenceSample::from_file(ReferenceSampleFile { columns: layout_columns(), rows: data })
            .unwrap()
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = FeatureTable::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 2.0], vec![3.0]],
        )
        .unwrap_err();
        assert_eq!(err, TableError::RaggedRow { row: 1, expected: 2, actual: 1 });
    }

    #[test]
    fn test_from_record() {
        let record = FeatureRecord::from_values([2.5; FEATURE_COUNT]);
        let table = FeatureTable::from_record(&record);

        assert_eq!(table.n_rows(), 1);
        assert_eq!(table.n_cols(), FEATURE_COUNT);
        assert_eq!(table.columns(), layout_columns().as_slice());
        assert_eq!(table.values()[[0, 19]], 2.5);
    }

    #[test]
    fn test_extension_appends_last_and_keeps_original() {
        for size in [0usize, 1, 7] {
            let reference = sample(size);
            let snapshot = reference.clone();
            let record = FeatureRecord::from_values([-1.0; FEATURE_COUNT]);

            let extended = reference.extended_with(&record).unwrap();

            assert_eq!(extended.n_rows(), size + 1);
            assert_eq!(extended.row(size).unwrap().to_vec(), record.values.to_vec());
            for i in 0..size {
                assert_eq!(extended.row(i).unwrap(), reference.table().row(i).unwrap());
            }
            assert_eq!(reference, snapshot);
        }
    }

    #[test]
    fn test_extension_rejects_drifted_columns() {
        let mut columns = layout_columns();
        columns.swap(2, 3);
        let reference = ReferenceSample::from_file(ReferenceSampleFile {
            columns,
            rows: vec![vec![0.0; FEATURE_COUNT]],
        })
        .unwrap();

        let err = reference.extended_with(&FeatureRecord::new()).unwrap_err();
        match err {
            TableError::ColumnMismatch(m) => assert_eq!(m.index, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_row_out_of_range() {
        assert!(sample(2).table().row(2).is_none());
    }
}
