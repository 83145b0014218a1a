//! Calibration matrix store.
//!
//! A calibration table is a rectangular numeric matrix with one row per
//! knob and one column per physical actuator. The source carries no row
//! names; rows are assigned synthetic identifiers `"<family>-<i>"` at
//! load time and the ordering is fixed for the life of the matrix.

use crate::error::KnobError;
use std::io::Read;
use std::path::Path;

/// Immutable calibration matrix for one knob family.
#[derive(Debug, Clone, PartialEq)]
pub struct KnobMatrix {
    family: String,
    row_names: Vec<String>,
    rows: Vec<Vec<f64>>,
    width: usize,
}

impl KnobMatrix {
    /// Build from in-memory rows. Fails when the table is empty or
    /// ragged.
    pub fn from_rows(family: &str, rows: Vec<Vec<f64>>) -> Result<Self, KnobError> {
        if rows.is_empty() {
            return Err(KnobError::configuration(family, "empty calibration table"));
        }
        let width = rows[0].len();
        if width == 0 {
            return Err(KnobError::configuration(
                family,
                "calibration table has no columns",
            ));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(KnobError::configuration(
                    family,
                    format!(
                        "table is not rectangular: row {} has {} columns, expected {}",
                        i,
                        row.len(),
                        width
                    ),
                ));
            }
        }
        let row_names = (0..rows.len()).map(|i| format!("{}-{}", family, i)).collect();
        Ok(Self {
            family: family.to_string(),
            row_names,
            rows,
            width,
        })
    }

    /// Parse a headerless CSV table.
    pub fn from_reader<R: Read>(family: &str, reader: R) -> Result<Self, KnobError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record
                .map_err(|e| KnobError::configuration(family, format!("row {}: {}", i, e)))?;
            let row = record
                .iter()
                .map(|field| {
                    field.parse::<f64>().map_err(|_| {
                        KnobError::configuration(
                            family,
                            format!("row {}: non-numeric cell '{}'", i, field),
                        )
                    })
                })
                .collect::<Result<Vec<f64>, KnobError>>()?;
            rows.push(row);
        }
        Self::from_rows(family, rows)
    }

    /// Load from a CSV file on disk.
    pub fn from_csv_path(family: &str, path: &Path) -> Result<Self, KnobError> {
        let file = std::fs::File::open(path).map_err(|e| {
            KnobError::configuration(family, format!("cannot open {}: {}", path.display(), e))
        })?;
        tracing::debug!(family, path = %path.display(), "loading calibration table");
        Self::from_reader(family, file)
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Synthetic row names, `"<family>-<i>"`, in storage order.
    pub fn names(&self) -> &[String] {
        &self.row_names
    }

    /// Number of knobs (rows).
    pub fn knob_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of physical actuators (columns).
    pub fn actuator_count(&self) -> usize {
        self.width
    }

    pub fn row_index(&self, name: &str) -> Option<usize> {
        self.row_names.iter().position(|n| n == name)
    }

    pub fn row(&self, index: usize) -> &[f64] {
        &self.rows[index]
    }

    /// Sub-matrix for a subset of row names.
    ///
    /// When `requested` covers every row the matrix is returned
    /// unchanged; otherwise rows whose name is absent from `requested`
    /// are removed, preserving the original relative order of the kept
    /// rows. Requested names that are not rows of this family are
    /// ignored here — classification upstream guarantees they never
    /// reach this point.
    pub fn project(&self, requested: &[&str]) -> KnobMatrix {
        let covers_all = self.row_names.iter().all(|n| requested.contains(&n.as_str()));
        if covers_all {
            return self.clone();
        }
        let mut row_names = Vec::new();
        let mut rows = Vec::new();
        for (name, row) in self.row_names.iter().zip(&self.rows) {
            if requested.contains(&name.as_str()) {
                row_names.push(name.clone());
                rows.push(row.clone());
            }
        }
        KnobMatrix {
            family: self.family.clone(),
            row_names,
            rows,
            width: self.width,
        }
    }

    /// Iterate `(name, row)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.row_names
            .iter()
            .map(String::as_str)
            .zip(self.rows.iter().map(Vec::as_slice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> KnobMatrix {
        KnobMatrix::from_rows(
            "sext",
            vec![
                vec![0.5, -0.2, 0.0],
                vec![1.0, 0.0, -1.0],
                vec![0.0, 2.0, 3.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn names_are_synthesized_per_row() {
        let m = sample();
        assert_eq!(m.names(), &["sext-0", "sext-1", "sext-2"]);
        assert_eq!(m.knob_count(), 3);
        assert_eq!(m.actuator_count(), 3);
    }

    #[test]
    fn project_full_cover_returns_matrix_unchanged() {
        let m = sample();
        // Order of the request does not matter for coverage.
        let p = m.project(&["sext-2", "sext-0", "sext-1"]);
        assert_eq!(p, m);
    }

    #[test]
    fn project_subset_keeps_original_relative_order() {
        let m = sample();
        let p = m.project(&["sext-2", "sext-0"]);
        assert_eq!(p.names(), &["sext-0", "sext-2"]);
        assert_eq!(p.row(0), &[0.5, -0.2, 0.0]);
        assert_eq!(p.row(1), &[0.0, 2.0, 3.0]);
    }

    #[test]
    fn ragged_table_is_rejected() {
        let err = KnobMatrix::from_rows("oct", vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, KnobError::Configuration { .. }));
    }

    #[test]
    fn empty_table_is_rejected() {
        assert!(KnobMatrix::from_rows("oct", vec![]).is_err());
    }

    #[test]
    fn csv_round_trip_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0.5,-0.2").unwrap();
        writeln!(file, "1.5, 2.5").unwrap();
        let m = KnobMatrix::from_csv_path("sext", file.path()).unwrap();
        assert_eq!(m.names(), &["sext-0", "sext-1"]);
        assert_eq!(m.row(1), &[1.5, 2.5]);
    }

    #[test]
    fn csv_non_numeric_cell_is_a_configuration_error() {
        let data = "1.0,2.0\nfoo,4.0\n";
        let err = KnobMatrix::from_reader("sext", data.as_bytes()).unwrap_err();
        match err {
            KnobError::Configuration { family, detail } => {
                assert_eq!(family, "sext");
                assert!(detail.contains("non-numeric"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn csv_missing_file_is_a_configuration_error() {
        let err =
            KnobMatrix::from_csv_path("sext", Path::new("/nonexistent/SextKnob.csv")).unwrap_err();
        assert!(matches!(err, KnobError::Configuration { .. }));
    }
}
