//! Gap-free, uniformly spaced signal

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{SampleInterval, Timeseries};
use crate::error::{AnalysisError, Result};

/// Signal whose `k`-th value sits at exactly `start + k * interval`.
///
/// Only produced by the resampler, the aligner, or a transform of an existing
/// uniform signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniformSignal {
    start: DateTime<Utc>,
    interval: SampleInterval,
    values: Vec<f64>,
}

impl UniformSignal {
    pub fn new(start: DateTime<Utc>, interval: SampleInterval, values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(AnalysisError::EmptyInput("uniform signal values"));
        }
        Ok(Self {
            start,
            interval,
            values,
        })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Timestamp of the last value.
    pub fn end(&self) -> DateTime<Utc> {
        self.time_at(self.values.len() - 1)
    }

    /// Sampling period used for any frequency axis derived from this signal.
    pub fn interval(&self) -> SampleInterval {
        self.interval
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.interval.sample_rate_hz()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn time_at(&self, k: usize) -> DateTime<Utc> {
        self.start + self.interval.offset(k)
    }

    pub fn times(&self) -> Vec<DateTime<Utc>> {
        (0..self.values.len()).map(|k| self.time_at(k)).collect()
    }

    /// Same time base, new values. Used by the filter stage.
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self> {
        Self::new(self.start, self.interval, values)
    }

    pub fn to_timeseries(&self) -> Result<Timeseries> {
        Timeseries::from_pairs(self.times().into_iter().zip(self.values.iter().copied()))
    }
}
