//! Zero-phase Butterworth low-pass filtering
//!
//! The digital filter comes from the analog Butterworth prototype through a
//! pre-warped bilinear transform and is stored as cascaded second-order
//! sections, each normalized to unit DC gain. Filtering runs forward and then
//! backward over an odd-extended copy of the signal, so group delay cancels
//! and features stay where they were in time. Downstream cross-correlation
//! depends on that: any phase shift here would show up as a false lag.

use num_complex::Complex64;
use std::f64::consts::PI;
use tracing::debug;

use super::detrend::detrend;
use crate::config::defaults::DEFAULT_FILTER_ORDER;
use crate::error::{AnalysisError, Result};
use crate::types::{SampleInterval, UniformSignal};

/// One second-order section, `a0` normalized to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl Biquad {
    fn dc_gain(&self) -> f64 {
        (self.b[0] + self.b[1] + self.b[2]) / (self.a[0] + self.a[1] + self.a[2])
    }

    /// Transposed direct form II state after a long run of input `level`.
    fn steady_state(&self, level: f64) -> [f64; 2] {
        let y = self.dc_gain() * level;
        let s2 = self.b[2] * level - self.a[2] * y;
        let s1 = self.b[1] * level - self.a[1] * y + s2;
        [s1, s2]
    }

    fn response(&self, z_inv: Complex64) -> Complex64 {
        let z_inv2 = z_inv * z_inv;
        let num = self.b[0] + z_inv * self.b[1] + z_inv2 * self.b[2];
        let den = self.a[0] + z_inv * self.a[1] + z_inv2 * self.a[2];
        num / den
    }
}

/// Digital Butterworth low-pass as cascaded second-order sections.
#[derive(Debug, Clone, PartialEq)]
pub struct ButterworthLowpass {
    order: usize,
    cutoff_hz: f64,
    sample_rate_hz: f64,
    sections: Vec<Biquad>,
}

impl ButterworthLowpass {
    /// Design an `order`-pole low-pass with -3 dB point at `cutoff_hz`.
    ///
    /// # Errors
    /// `InvalidFilterParameters` unless `order >= 1` and
    /// `0 < cutoff_hz < sample_rate_hz / 2`.
    pub fn design(order: usize, cutoff_hz: f64, sample_rate_hz: f64) -> Result<Self> {
        if order == 0 {
            return Err(AnalysisError::InvalidFilterParameters(
                "filter order must be at least 1".to_string(),
            ));
        }
        if !(sample_rate_hz.is_finite() && sample_rate_hz > 0.0) {
            return Err(AnalysisError::InvalidFilterParameters(format!(
                "sample rate must be positive, got {sample_rate_hz}"
            )));
        }
        let nyquist = sample_rate_hz / 2.0;
        if !(cutoff_hz > 0.0 && cutoff_hz < nyquist) {
            return Err(AnalysisError::InvalidFilterParameters(format!(
                "cutoff {cutoff_hz} Hz must lie strictly between 0 and Nyquist {nyquist} Hz"
            )));
        }

        // Pre-warped analog cutoff for the bilinear map s = (z - 1) / (z + 1).
        let warped = (PI * cutoff_hz / sample_rate_hz).tan();
        let n = order as f64;
        let mut sections = Vec::with_capacity(order.div_ceil(2));

        for k in 0..order / 2 {
            let theta = PI * (2.0 * k as f64 + n + 1.0) / (2.0 * n);
            let s = Complex64::from_polar(warped, theta);
            let z = (1.0 + s) / (1.0 - s);
            let a1 = -2.0 * z.re;
            let a2 = z.norm_sqr();
            let gain = (1.0 + a1 + a2) / 4.0;
            sections.push(Biquad {
                b: [gain, 2.0 * gain, gain],
                a: [1.0, a1, a2],
            });
        }

        if order % 2 == 1 {
            let z = (1.0 - warped) / (1.0 + warped);
            let gain = (1.0 - z) / 2.0;
            sections.push(Biquad {
                b: [gain, gain, 0.0],
                a: [1.0, -z, 0.0],
            });
        }

        debug!(order, cutoff_hz, sample_rate_hz, sections = sections.len(), "Designed Butterworth low-pass");
        Ok(Self {
            order,
            cutoff_hz,
            sample_rate_hz,
            sections,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn cutoff_hz(&self) -> f64 {
        self.cutoff_hz
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Edge padding used by [`Self::filtfilt`].
    pub fn pad_len(&self) -> usize {
        3 * (self.order + 1)
    }

    /// Magnitude of the (single-pass) frequency response at `freq_hz`.
    pub fn magnitude_at(&self, freq_hz: f64) -> f64 {
        let omega = 2.0 * PI * freq_hz / self.sample_rate_hz;
        let z_inv = Complex64::from_polar(1.0, -omega);
        self.sections
            .iter()
            .map(|s| s.response(z_inv))
            .fold(Complex64::new(1.0, 0.0), |acc, h| acc * h)
            .norm()
    }

    /// Single forward pass, starting from the steady state for `x[0]`.
    fn filter_from_steady_state(&self, x: &[f64]) -> Vec<f64> {
        let mut out = x.to_vec();
        let mut level = x.first().copied().unwrap_or(0.0);
        for section in &self.sections {
            let [mut s1, mut s2] = section.steady_state(level);
            level *= section.dc_gain();
            for v in &mut out {
                let input = *v;
                let y = section.b[0] * input + s1;
                s1 = section.b[1] * input - section.a[1] * y + s2;
                s2 = section.b[2] * input - section.a[2] * y;
                *v = y;
            }
        }
        out
    }

    /// Forward-backward filtering with odd extension at both edges.
    ///
    /// # Errors
    /// `InsufficientData` when the signal is not longer than [`Self::pad_len`].
    pub fn filtfilt(&self, x: &[f64]) -> Result<Vec<f64>> {
        let n = x.len();
        let pad = self.pad_len();
        if n <= pad {
            return Err(AnalysisError::InsufficientData {
                needed: pad + 1,
                available: n,
            });
        }

        let first = x[0];
        let last = x[n - 1];
        let mut ext = Vec::with_capacity(n + 2 * pad);
        ext.extend((1..=pad).rev().map(|i| 2.0 * first - x[i]));
        ext.extend_from_slice(x);
        ext.extend((n - 1 - pad..n - 1).rev().map(|i| 2.0 * last - x[i]));

        let mut y = self.filter_from_steady_state(&ext);
        y.reverse();
        let mut y = self.filter_from_steady_state(&y);
        y.reverse();

        Ok(y[pad..pad + n].to_vec())
    }
}

/// Detrend `values`, then apply a zero-phase Butterworth low-pass.
///
/// `cutoff_hz` is in the same units as `1 / interval`.
pub fn lowpass(
    values: &[f64],
    cutoff_hz: f64,
    interval: SampleInterval,
    order: usize,
) -> Result<Vec<f64>> {
    if values.is_empty() {
        return Err(AnalysisError::EmptyInput("signal"));
    }
    let filter = ButterworthLowpass::design(order, cutoff_hz, interval.sample_rate_hz())?;
    let detrended = detrend(values)?;
    filter.filtfilt(&detrended)
}

impl UniformSignal {
    /// Zero-phase low-pass on this signal's own interval.
    pub fn lowpass(&self, cutoff_hz: f64, order: usize) -> Result<UniformSignal> {
        self.with_values(lowpass(self.values(), cutoff_hz, self.interval(), order)?)
    }

    /// Low-pass with the default order.
    pub fn lowpass_default(&self, cutoff_hz: f64) -> Result<UniformSignal> {
        self.lowpass(cutoff_hz, DEFAULT_FILTER_ORDER)
    }

    /// Same time base with the least-squares line removed.
    pub fn detrended(&self) -> Result<UniformSignal> {
        self.with_values(detrend(self.values())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::CorrelationEngine;

    fn sine(n: usize, period: f64) -> Vec<f64> {
        (0..n).map(|k| (2.0 * PI * k as f64 / period).sin()).collect()
    }

    #[test]
    fn test_invalid_parameters() {
        for (order, cutoff) in [(0, 0.1), (5, 0.0), (5, -0.1), (5, 0.5), (5, 0.7), (5, f64::NAN)] {
            assert!(
                matches!(
                    ButterworthLowpass::design(order, cutoff, 1.0),
                    Err(AnalysisError::InvalidFilterParameters(_))
                ),
                "order {order} cutoff {cutoff} should be rejected"
            );
        }
    }

    #[test]
    fn test_section_layout() {
        assert_eq!(ButterworthLowpass::design(5, 0.1, 1.0).unwrap().sections().len(), 3);
        assert_eq!(ButterworthLowpass::design(4, 0.1, 1.0).unwrap().sections().len(), 2);
        assert_eq!(ButterworthLowpass::design(1, 0.1, 1.0).unwrap().sections().len(), 1);
    }

    #[test]
    fn test_frequency_response() {
        for order in 1..=8 {
            let filter = ButterworthLowpass::design(order, 0.05, 1.0).unwrap();
            assert!((filter.magnitude_at(0.0) - 1.0).abs() < 1e-9, "order {order} DC gain");
            assert!(
                (filter.magnitude_at(0.05) - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6,
                "order {order} -3 dB point"
            );
        }
        let filter = ButterworthLowpass::design(5, 0.05, 1.0).unwrap();
        assert!(filter.magnitude_at(0.2) < 1e-3);
    }

    #[test]
    fn test_removes_high_frequency() {
        let low = sine(1000, 100.0);
        let noisy: Vec<f64> = low
            .iter()
            .zip(sine(1000, 4.0))
            .map(|(l, h)| l + 0.5 * h)
            .collect();

        let filtered = lowpass(&noisy, 0.05, SampleInterval::from_secs(1).unwrap(), 5).unwrap();
        let reference = detrend(&low).unwrap();

        let max_err = filtered[50..950]
            .iter()
            .zip(&reference[50..950])
            .map(|(f, r)| (f - r).abs())
            .fold(0.0, f64::max);
        assert!(max_err < 0.05, "max error {max_err}");
    }

    #[test]
    fn test_zero_phase_no_lag() {
        let input = sine(1000, 100.0);
        let output = lowpass(&input, 0.05, SampleInterval::from_secs(1).unwrap(), 5).unwrap();
        assert_eq!(output.len(), input.len());

        let xcorr = CorrelationEngine::correlate_uniform(
            &input,
            &output,
            SampleInterval::from_secs(1).unwrap(),
            20,
        )
        .unwrap();
        assert_eq!(xcorr.peak_lag(), 0);
    }

    #[test]
    fn test_short_signal_rejected() {
        let result = lowpass(&[1.0; 10], 0.1, SampleInterval::from_secs(1).unwrap(), 5);
        assert_eq!(
            result,
            Err(AnalysisError::InsufficientData {
                needed: 19,
                available: 10
            })
        );
    }

    #[test]
    fn test_cutoff_checked_against_interval() {
        // 60 s interval: Nyquist is 1/120 Hz.
        let interval = SampleInterval::from_secs(60).unwrap();
        let values = sine(200, 20.0);
        assert!(lowpass(&values, 1.0 / 100.0, interval, 5).is_err());
        assert!(lowpass(&values, 1.0 / 600.0, interval, 5).is_ok());
    }
}
