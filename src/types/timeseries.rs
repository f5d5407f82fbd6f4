//! Irregularly-sampled sensor timeseries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// One `(timestamp, value)` reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Ordered sensor readings with strictly increasing timestamps.
///
/// Spacing may be irregular. The series is never mutated after construction;
/// every transform in this crate returns a new value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeseries {
    samples: Vec<Sample>,
}

impl Timeseries {
    /// Build a timeseries, rejecting out-of-order or duplicate timestamps and
    /// non-finite values.
    pub fn new(samples: Vec<Sample>) -> Result<Self> {
        for (index, sample) in samples.iter().enumerate() {
            if !sample.value.is_finite() {
                return Err(AnalysisError::NonFiniteValue { index });
            }
        }
        if let Some(index) = samples
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(AnalysisError::UnorderedTimestamps { index: index + 1 });
        }
        Ok(Self { samples })
    }

    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (DateTime<Utc>, f64)>,
    {
        Self::new(pairs.into_iter().map(|(t, v)| Sample::new(t, v)).collect())
    }

    /// Build from `(unix_seconds, value)` pairs.
    pub fn from_epoch_secs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (i64, f64)>,
    {
        let samples = pairs
            .into_iter()
            .map(|(secs, value)| {
                DateTime::<Utc>::from_timestamp(secs, 0)
                    .map(|t| Sample::new(t, value))
                    .ok_or(AnalysisError::InvalidTimestamp(secs))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(samples)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.samples.iter().map(|s| s.timestamp).collect()
    }

    /// Linearly interpolated value at `t`.
    ///
    /// Between two samples the value lies on the segment joining them. Outside
    /// the sampled range the first (or last) segment is extended. A single
    /// sample yields its own value everywhere.
    pub fn interpolate_at(&self, t: DateTime<Utc>) -> Option<f64> {
        let n = self.samples.len();
        match n {
            0 => return None,
            1 => return Some(self.samples[0].value),
            _ => {}
        }

        // Index of the first sample strictly after t, clamped so that
        // (upper - 1, upper) is always a valid segment.
        let upper = self
            .samples
            .partition_point(|s| s.timestamp <= t)
            .clamp(1, n - 1);
        let left = &self.samples[upper - 1];
        let right = &self.samples[upper];

        if left.timestamp == t {
            return Some(left.value);
        }

        let span = seconds_between(left.timestamp, right.timestamp);
        let frac = seconds_between(left.timestamp, t) / span;
        Some(left.value + frac * (right.value - left.value))
    }

    /// Value of the last sample at or before `t` (forward-fill lookup).
    pub fn last_known_at(&self, t: DateTime<Utc>) -> Option<f64> {
        let idx = self.samples.partition_point(|s| s.timestamp <= t);
        idx.checked_sub(1).map(|i| self.samples[i].value)
    }
}

/// Signed seconds (with nanosecond precision) from `a` to `b`.
pub fn seconds_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    let delta = b - a;
    delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) * 1e-9
}
