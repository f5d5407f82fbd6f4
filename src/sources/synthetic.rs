//! Synthetic (virtual) sensor generation

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{AnalysisError, Result};
use crate::types::{SampleInterval, Timeseries};

/// Parameters of a virtual sensor:
/// `offset + trend * t + amplitude * sin(2π (t - delay) / period) + noise`,
/// with `t` in seconds since `start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticParams {
    pub start: DateTime<Utc>,
    pub interval: SampleInterval,
    pub count: usize,
    pub amplitude: f64,
    pub period_secs: f64,
    /// Delay of the waveform in seconds; positive values shift it later.
    #[serde(default)]
    pub delay_secs: f64,
    #[serde(default)]
    pub offset: f64,
    /// Linear drift per second.
    #[serde(default)]
    pub trend_per_sec: f64,
    /// Standard deviation of additive Gaussian noise.
    #[serde(default)]
    pub noise_std: f64,
    #[serde(default)]
    pub seed: u64,
}

impl SyntheticParams {
    /// Noise-free unit sine.
    pub fn sine(start: DateTime<Utc>, interval: SampleInterval, count: usize, period_secs: f64) -> Self {
        Self {
            start,
            interval,
            count,
            amplitude: 1.0,
            period_secs,
            delay_secs: 0.0,
            offset: 0.0,
            trend_per_sec: 0.0,
            noise_std: 0.0,
            seed: 0,
        }
    }

    pub fn with_delay(mut self, delay_secs: f64) -> Self {
        self.delay_secs = delay_secs;
        self
    }

    pub fn with_noise(mut self, noise_std: f64, seed: u64) -> Self {
        self.noise_std = noise_std;
        self.seed = seed;
        self
    }

    pub fn with_trend(mut self, trend_per_sec: f64) -> Self {
        self.trend_per_sec = trend_per_sec;
        self
    }

    /// Generate the readings. Deterministic for a given seed.
    pub fn generate(&self) -> Result<Timeseries> {
        if self.count == 0 {
            return Err(AnalysisError::EmptyInput("synthetic sample count"));
        }
        if !(self.period_secs > 0.0) {
            return Err(AnalysisError::InvalidParameter(format!(
                "synthetic period must be positive, got {}",
                self.period_secs
            )));
        }

        let noise = if self.noise_std > 0.0 {
            let dist = Normal::new(0.0, self.noise_std).map_err(|e| {
                AnalysisError::InvalidParameter(format!("noise std {}: {e}", self.noise_std))
            })?;
            Some(dist)
        } else {
            None
        };
        let mut rng = StdRng::seed_from_u64(self.seed);

        let samples = (0..self.count).map(|k| {
            let t = (self.interval.as_secs() * k as u64) as f64;
            let phase = 2.0 * PI * (t - self.delay_secs) / self.period_secs;
            let mut value = self.offset + self.trend_per_sec * t + self.amplitude * phase.sin();
            if let Some(dist) = &noise {
                value += dist.sample(&mut rng);
            }
            (self.start + self.interval.offset(k), value)
        });

        Timeseries::from_pairs(samples)
    }
}
