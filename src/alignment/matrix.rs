//! Multi-column signal on one shared time axis

use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::types::{SampleInterval, UniformSignal};

/// Output of the aligner: one named column per input signal, all sampled at
/// `start + k * interval`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedMatrix {
    start: DateTime<Utc>,
    interval: SampleInterval,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

/// One labeled row of an [`AlignedMatrix`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedRow<'a> {
    pub time: DateTime<Utc>,
    pub values: Vec<(&'a str, f64)>,
}

impl AlignedMatrix {
    pub(crate) fn new(
        start: DateTime<Utc>,
        interval: SampleInterval,
        names: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let rows = columns.first().map_or(0, Vec::len);
        if rows == 0 {
            return Err(AnalysisError::EmptyInput("aligned columns"));
        }
        if columns.iter().any(|c| c.len() != rows) || names.len() != columns.len() {
            return Err(AnalysisError::InsufficientData {
                needed: rows,
                available: columns.iter().map(Vec::len).min().unwrap_or(0),
            });
        }
        Ok(Self {
            start,
            interval,
            names,
            columns,
        })
    }

    /// Shared sampling period: the unit for every lag computed on this matrix.
    pub fn interval(&self) -> SampleInterval {
        self.interval
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.time_at(self.len() - 1)
    }

    /// Number of rows (time steps).
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of value columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn time_at(&self, k: usize) -> DateTime<Utc> {
        self.start + self.interval.offset(k)
    }

    pub fn times(&self) -> Vec<DateTime<Utc>> {
        (0..self.len()).map(|k| self.time_at(k)).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    pub fn column_at(&self, index: usize) -> Option<&[f64]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    /// Extract one column as a standalone uniform signal.
    pub fn signal(&self, name: &str) -> Option<UniformSignal> {
        let values = self.column(name)?.to_vec();
        UniformSignal::new(self.start, self.interval, values).ok()
    }

    /// Labeled table view: time plus `(column name, value)` per row.
    pub fn rows(&self) -> Vec<AlignedRow<'_>> {
        (0..self.len())
            .map(|k| AlignedRow {
                time: self.time_at(k),
                values: self
                    .names
                    .iter()
                    .zip(&self.columns)
                    .map(|(name, col)| (name.as_str(), col[k]))
                    .collect(),
            })
            .collect()
    }

    /// Plain numeric matrix, one row per time step. Column 0 is the Unix
    /// timestamp in seconds, followed by the value columns in input order.
    pub fn to_array(&self) -> Array2<f64> {
        let rows = self.len();
        let cols = self.width() + 1;
        Array2::from_shape_fn((rows, cols), |(r, c)| {
            if c == 0 {
                self.time_at(r).timestamp() as f64
            } else {
                self.columns[c - 1][r]
            }
        })
    }

    /// Chronological train/test split.
    ///
    /// The first `floor(len * train_fraction)` rows form the training set and
    /// the rest the test set; both keep the shared interval.
    pub fn split(&self, train_fraction: f64) -> Result<(Self, Self)> {
        if !(train_fraction > 0.0 && train_fraction < 1.0) {
            return Err(AnalysisError::InvalidSplit(train_fraction));
        }
        let n = self.len();
        let n_train = (n as f64 * train_fraction).floor() as usize;
        if n_train == 0 || n_train == n {
            return Err(AnalysisError::InsufficientData {
                needed: 2,
                available: n,
            });
        }

        let slice = |from: usize, to: usize| -> Result<Self> {
            Self::new(
                self.time_at(from),
                self.interval,
                self.names.clone(),
                self.columns.iter().map(|c| c[from..to].to_vec()).collect(),
            )
        };
        Ok((slice(0, n_train)?, slice(n_train, n)?))
    }
}
