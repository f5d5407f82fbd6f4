//! FFT spectra using rustfft
//!
//! # Features
//!
//! - Pre-planned FFT for repeated transforms of the same length
//! - Normalized amplitude spectrum (positive frequencies only, detrended)
//! - Periodogram power spectral density (no detrending, DC power visible)
//! - Peak extraction to pick a low-pass cutoff from a spectrum
//!
//! # Example
//!
//! ```ignore
//! use sensor_sigproc::processing::{power_spectral_density, find_dominant_frequencies};
//!
//! let psd = power_spectral_density(signal.values(), signal.interval())?;
//! let peaks = find_dominant_frequencies(&psd, 3);
//! ```

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

use super::detrend::{detrend, mean, std_dev};
use super::{Spectrum, SpectrumKind};
use crate::error::{AnalysisError, Result};
use crate::types::SampleInterval;

// ============================================================================
// Standalone Spectrum Functions
// ============================================================================

/// Normalized amplitude spectrum of a uniform signal.
///
/// The signal is detrended, transformed at its exact length, and each bin's
/// magnitude is divided by the sample count. Only strictly positive
/// frequencies are returned; a real input's negative half mirrors them.
pub fn fourier_spectrum(values: &[f64], interval: SampleInterval) -> Result<Spectrum> {
    if values.is_empty() {
        return Err(AnalysisError::EmptyInput("signal"));
    }

    let detrended = detrend(values)?;
    let processor = FftProcessor::new(detrended.len(), interval)?;
    let bins = processor.transform(&detrended)?;

    let n = bins.len();
    let scale = 1.0 / n as f64;
    let resolution = processor.frequency_resolution();

    // Matches the positive part of the standard FFT frequency layout.
    let (frequencies, magnitudes) = (1..=(n - 1) / 2)
        .map(|k| (k as f64 * resolution, bins[k].norm() * scale))
        .unzip();

    Ok(Spectrum::new(
        SpectrumKind::Amplitude,
        frequencies,
        magnitudes,
        interval,
    ))
}

/// One-sided periodogram power spectral density.
///
/// Boxcar window, density scaling (`|X_k|^2 / (fs * n)`), bins other than DC
/// and Nyquist doubled. The input is deliberately not detrended so that any
/// DC offset or drift shows up as low-frequency power.
pub fn power_spectral_density(values: &[f64], interval: SampleInterval) -> Result<Spectrum> {
    if values.is_empty() {
        return Err(AnalysisError::EmptyInput("signal"));
    }

    let processor = FftProcessor::new(values.len(), interval)?;
    let bins = processor.transform(values)?;

    let n = bins.len();
    let fs = interval.sample_rate_hz();
    let scale = 1.0 / (fs * n as f64);
    let resolution = processor.frequency_resolution();
    let has_nyquist = n % 2 == 0;

    let (frequencies, power) = (0..=n / 2)
        .map(|k| {
            let mut p = bins[k].norm_sqr() * scale;
            let is_nyquist = has_nyquist && k == n / 2;
            if k != 0 && !is_nyquist {
                p *= 2.0;
            }
            (k as f64 * resolution, p)
        })
        .unzip();

    Ok(Spectrum::new(
        SpectrumKind::PowerDensity,
        frequencies,
        power,
        interval,
    ))
}

/// Mean divided by population standard deviation.
///
/// Best-effort diagnostic: returns 0 for empty input or zero spread instead of
/// failing.
pub fn signal_to_noise(values: &[f64], detrended: bool) -> f64 {
    let owned;
    let data = if detrended {
        match detrend(values) {
            Ok(d) => {
                owned = d;
                owned.as_slice()
            }
            Err(_) => return 0.0,
        }
    } else {
        values
    };

    let sd = std_dev(data);
    if sd == 0.0 || !sd.is_finite() {
        return 0.0;
    }
    mean(data) / sd
}

/// Frequency and magnitude of the largest bin within `[low_freq, high_freq]`.
pub fn find_peak_in_band(spectrum: &Spectrum, low_freq: f64, high_freq: f64) -> Option<(f64, f64)> {
    spectrum
        .frequencies
        .iter()
        .zip(spectrum.magnitudes.iter())
        .filter(|(&f, _)| f >= low_freq && f <= high_freq)
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(&f, &m)| (f, m))
}

/// Find dominant frequencies using true peak detection.
///
/// Local maxima (strictly higher than both neighbours) sorted by magnitude,
/// largest first, truncated to `n_peaks`.
pub fn find_dominant_frequencies(spectrum: &Spectrum, n_peaks: usize) -> Vec<(f64, f64)> {
    if spectrum.magnitudes.len() < 3 {
        let mut all: Vec<(f64, f64)> = spectrum.pairs().collect();
        all.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        all.truncate(n_peaks);
        return all;
    }

    let mut peaks: Vec<(f64, f64)> = Vec::new();

    for i in 1..spectrum.magnitudes.len() - 1 {
        let prev = spectrum.magnitudes[i - 1];
        let curr = spectrum.magnitudes[i];
        let next = spectrum.magnitudes[i + 1];

        if curr > prev && curr > next {
            peaks.push((spectrum.frequencies[i], curr));
        }
    }

    peaks.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    peaks.truncate(n_peaks);
    peaks
}

// ============================================================================
// FFT Processor (Pre-planned for repeated use)
// ============================================================================

/// FFT processor with a pre-planned transform of a fixed length.
///
/// The length is used as-is (no zero padding), so bin `k` sits at exactly
/// `k / (n * interval)`.
pub struct FftProcessor {
    fft: Arc<dyn Fft<f64>>,
    size: usize,
    interval: SampleInterval,
}

impl FftProcessor {
    pub fn new(size: usize, interval: SampleInterval) -> Result<Self> {
        if size == 0 {
            return Err(AnalysisError::EmptyInput("FFT size"));
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);

        Ok(Self {
            fft,
            size,
            interval,
        })
    }

    /// Complex DFT of a real signal of exactly [`Self::size`] samples.
    pub fn transform(&self, signal: &[f64]) -> Result<Vec<Complex<f64>>> {
        if signal.len() != self.size {
            return Err(AnalysisError::InsufficientData {
                needed: self.size,
                available: signal.len(),
            });
        }

        let mut buffer: Vec<Complex<f64>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
        self.fft.process(&mut buffer);
        Ok(buffer)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Hz per bin.
    pub fn frequency_resolution(&self) -> f64 {
        self.interval.sample_rate_hz() / self.size as f64
    }
}

// ============================================================================
// Tests
// ============================================================================
