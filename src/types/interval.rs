//! Whole-second sample interval

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Dominant spacing between consecutive samples, always a strictly positive
/// number of whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct SampleInterval(u64);

impl SampleInterval {
    /// Create an interval of `secs` seconds. Zero is rejected.
    pub fn from_secs(secs: u64) -> Result<Self> {
        if secs == 0 {
            return Err(AnalysisError::DegenerateInterval { seconds: 0.0 });
        }
        Ok(Self(secs))
    }

    pub fn as_secs(self) -> u64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64
    }

    /// Sampling frequency in Hz (`1 / interval`).
    pub fn sample_rate_hz(self) -> f64 {
        1.0 / self.as_secs_f64()
    }

    /// Nyquist frequency in Hz.
    pub fn nyquist_hz(self) -> f64 {
        0.5 * self.sample_rate_hz()
    }

    pub fn as_time_delta(self) -> TimeDelta {
        TimeDelta::seconds(self.0 as i64)
    }

    /// Offset of the `k`-th grid point from the grid start.
    pub fn offset(self, k: usize) -> TimeDelta {
        TimeDelta::seconds((self.0 as i64) * (k as i64))
    }
}

impl TryFrom<u64> for SampleInterval {
    type Error = AnalysisError;

    fn try_from(secs: u64) -> Result<Self> {
        Self::from_secs(secs)
    }
}

impl From<SampleInterval> for u64 {
    fn from(interval: SampleInterval) -> Self {
        interval.0
    }
}

impl std::fmt::Display for SampleInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s", self.0)
    }
}
