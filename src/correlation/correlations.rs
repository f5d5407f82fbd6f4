//! Lagged correlation between uniform signals
//!
//! Cross-correlation is the tool for estimating the delay between two sensors:
//! after alignment onto a common grid the lag with the strongest normalized
//! correlation, times the grid interval, is the delay in seconds.
//!
//! ## Lag convention
//! A positive lag `k` means the second signal is delayed by `k` samples
//! relative to the first: `c[k] = Σ a[i] · b[i + k]`.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::alignment::Aligner;
use crate::config::defaults::DEFAULT_LAG_PERCENTAGE;
use crate::error::{AnalysisError, Result};
use crate::processing::{detrend, mean, std_dev};
use crate::sources::TimeseriesSource;
use crate::types::SampleInterval;

/// How many lags either side of zero to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LagSpec {
    /// Exactly `L` samples.
    Absolute(usize),
    /// `floor(n * p / 100)` samples of the aligned length `n`, `p` in `[0, 100)`.
    Percentage(f64),
}

impl Default for LagSpec {
    fn default() -> Self {
        LagSpec::Percentage(DEFAULT_LAG_PERCENTAGE)
    }
}

impl LagSpec {
    /// Resolve to a sample count for a signal of `len` samples.
    pub fn resolve(self, len: usize) -> Result<usize> {
        match self {
            LagSpec::Absolute(lag) => Ok(lag),
            LagSpec::Percentage(p) => {
                if !(p.is_finite() && (0.0..100.0).contains(&p)) {
                    return Err(AnalysisError::InvalidLagPercentage(p));
                }
                Ok((len as f64 * p / 100.0).floor() as usize)
            }
        }
    }
}

/// Normalized cross-correlation over lags `[-L, +L]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// `-L ..= L`
    pub lags: Vec<i64>,
    pub values: Vec<f64>,
    /// Grid interval the lags are counted in
    pub interval: SampleInterval,
}

impl CorrelationResult {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `L`, the largest lag evaluated.
    pub fn max_lag(&self) -> usize {
        self.values.len() / 2
    }

    pub fn pairs(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.lags.iter().copied().zip(self.values.iter().copied())
    }

    /// Correlation at `lag`, if it was evaluated.
    pub fn value_at(&self, lag: i64) -> Option<f64> {
        let index = lag + self.max_lag() as i64;
        usize::try_from(index)
            .ok()
            .and_then(|i| self.values.get(i).copied())
    }

    /// Lag of the largest correlation, re-centered so 0 means "no delay".
    /// Ties resolve to the most negative lag.
    pub fn peak_lag(&self) -> i64 {
        self.peak().map_or(0, |(lag, _)| lag)
    }

    /// `(lag, value)` of the largest correlation.
    pub fn peak(&self) -> Option<(i64, f64)> {
        self.pairs().fold(None, |best, (lag, v)| match best {
            Some((_, bv)) if v <= bv => best,
            _ => Some((lag, v)),
        })
    }

    /// [`Self::peak_lag`] converted to seconds on the aligned grid.
    pub fn peak_lag_seconds(&self) -> f64 {
        self.peak_lag() as f64 * self.interval.as_secs_f64()
    }
}

/// Autocorrelation for lags `0 ..= L`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutocorrelationResult {
    pub values: Vec<f64>,
}

impl AutocorrelationResult {
    pub fn max_lag(&self) -> usize {
        self.values.len().saturating_sub(1)
    }

    pub fn at(&self, lag: usize) -> Option<f64> {
        self.values.get(lag).copied()
    }

    /// First lag at which the autocorrelation drops to or below zero.
    ///
    /// A rough decorrelation time, useful for choosing a lag window.
    pub fn first_zero_crossing(&self) -> Option<usize> {
        self.values.iter().position(|&v| v <= 0.0)
    }
}

/// Correlation analysis engine
pub struct CorrelationEngine;

impl CorrelationEngine {
    /// Detrended autocorrelation normalized by the lag-0 energy.
    ///
    /// # Errors
    /// - `EmptyInput` for an empty slice
    /// - `InvalidLag` when `max_lag > values.len()`
    pub fn autocorrelation(values: &[f64], max_lag: usize) -> Result<AutocorrelationResult> {
        if values.is_empty() {
            return Err(AnalysisError::EmptyInput("signal"));
        }
        if max_lag > values.len() {
            return Err(AnalysisError::InvalidLag {
                lag: max_lag,
                available: values.len(),
            });
        }

        let x = detrend(values)?;
        let energy: f64 = x.iter().map(|v| v * v).sum();
        if energy == 0.0 {
            return Ok(AutocorrelationResult {
                values: vec![0.0; max_lag + 1],
            });
        }

        let values = (0..=max_lag)
            .map(|k| lagged_dot(&x, &x, k as i64) / energy)
            .collect();
        Ok(AutocorrelationResult { values })
    }

    /// Normalized cross-correlation of two equal-length uniform arrays.
    ///
    /// Both inputs are mean-centered; the full correlation is divided by
    /// `std_a * std_b * n` (population std) and the central `2 * lag + 1`
    /// values are kept. Constant inputs correlate to all zeros.
    ///
    /// # Errors
    /// - `EmptyInput` for empty arrays
    /// - `InsufficientData` when the lengths differ
    /// - `InvalidLag` when `lag > n - 1`
    pub fn correlate_uniform(
        a: &[f64],
        b: &[f64],
        interval: SampleInterval,
        lag: usize,
    ) -> Result<CorrelationResult> {
        if a.is_empty() || b.is_empty() {
            return Err(AnalysisError::EmptyInput("signal"));
        }
        if a.len() != b.len() {
            return Err(AnalysisError::InsufficientData {
                needed: a.len(),
                available: b.len(),
            });
        }
        let n = a.len();
        if lag > n - 1 {
            return Err(AnalysisError::InvalidLag {
                lag,
                available: n - 1,
            });
        }

        let mean_a = mean(a);
        let mean_b = mean(b);
        let centered_a: Vec<f64> = a.iter().map(|v| v - mean_a).collect();
        let centered_b: Vec<f64> = b.iter().map(|v| v - mean_b).collect();

        let norm = std_dev(a) * std_dev(b) * n as f64;
        let lag = lag as i64;
        let lags: Vec<i64> = (-lag..=lag).collect();
        let values = if norm == 0.0 || !norm.is_finite() {
            vec![0.0; lags.len()]
        } else {
            lags.iter()
                .map(|&k| lagged_dot(&centered_a, &centered_b, k) / norm)
                .collect()
        };

        Ok(CorrelationResult {
            lags,
            values,
            interval,
        })
    }

    /// Align two sources, then cross-correlate them.
    ///
    /// The result's interval is the aligned (finest) interval, so
    /// [`CorrelationResult::peak_lag_seconds`] is in real seconds even when
    /// the sources were sampled at different rates.
    pub fn cross_correlation(
        a: &dyn TimeseriesSource,
        b: &dyn TimeseriesSource,
        lag: LagSpec,
    ) -> Result<CorrelationResult> {
        let matrix = Aligner::align_positional(&[a, b], None)?;
        let n = matrix.len();
        let max_lag = lag.resolve(n)?;

        let col_a = matrix.column_at(0).ok_or(AnalysisError::EmptyInput("aligned column"))?;
        let col_b = matrix.column_at(1).ok_or(AnalysisError::EmptyInput("aligned column"))?;
        let result = Self::correlate_uniform(col_a, col_b, matrix.interval(), max_lag)?;

        debug!(
            a = a.name(),
            b = b.name(),
            aligned_len = n,
            max_lag,
            peak_lag = result.peak_lag(),
            peak_lag_seconds = result.peak_lag_seconds(),
            "Cross-correlated signals"
        );
        Ok(result)
    }

    /// Cross-correlate many independent pairs in parallel.
    ///
    /// Results come back in input order; one failing pair does not affect
    /// the others.
    pub fn analyze_pairs(
        pairs: &[(&dyn TimeseriesSource, &dyn TimeseriesSource)],
        lag: LagSpec,
    ) -> Vec<Result<CorrelationResult>> {
        let results: Vec<Result<CorrelationResult>> = pairs
            .par_iter()
            .map(|(a, b)| Self::cross_correlation(*a, *b, lag))
            .collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(pairs = pairs.len(), failed, "Analyzed signal pairs");
        results
    }
}

/// `Σ a[i] · b[i + k]` over the overlapping indices.
fn lagged_dot(a: &[f64], b: &[f64], k: i64) -> f64 {
    let n = a.len().min(b.len()) as i64;
    let (start, end) = if k >= 0 { (0, n - k) } else { (-k, n) };
    (start.max(0)..end.max(0))
        .map(|i| a[i as usize] * b[(i + k) as usize])
        .sum()
}
