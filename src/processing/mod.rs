//! Signal processing - detrending, zero-phase low-pass filtering and spectra

mod detrend;
mod fft;
mod filter;

pub use detrend::{detrend, linear_fit};
pub use fft::*;
pub use filter::{lowpass, Biquad, ButterworthLowpass};

pub(crate) use detrend::{mean, std_dev};

use serde::{Deserialize, Serialize};

use crate::types::SampleInterval;

/// What the magnitudes of a [`Spectrum`] measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrumKind {
    /// `|X_k| / n` of the detrended signal
    Amplitude,
    /// One-sided periodogram, units²/Hz
    PowerDensity,
}

/// Frequency spectrum of a uniform signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    pub kind: SpectrumKind,
    /// Frequency bins (Hz), ascending
    pub frequencies: Vec<f64>,
    /// Magnitude or power density at each frequency
    pub magnitudes: Vec<f64>,
    /// Sample interval of the analysed signal
    pub interval: SampleInterval,
    /// Frequency of the largest magnitude (0 for an empty spectrum)
    pub peak_frequency: f64,
}

impl Spectrum {
    pub fn new(
        kind: SpectrumKind,
        frequencies: Vec<f64>,
        magnitudes: Vec<f64>,
        interval: SampleInterval,
    ) -> Self {
        let mut spectrum = Self {
            kind,
            frequencies,
            magnitudes,
            interval,
            peak_frequency: 0.0,
        };
        spectrum.peak_frequency = spectrum.peak().map_or(0.0, |(f, _)| f);
        spectrum
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// `(frequency, magnitude)` pairs in ascending frequency.
    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies
            .iter()
            .copied()
            .zip(self.magnitudes.iter().copied())
    }

    /// Largest bin. Ties resolve to the lowest frequency.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.pairs().fold(None, |best, (f, m)| match best {
            Some((_, bm)) if m <= bm => best,
            _ => Some((f, m)),
        })
    }

    /// Top `n` local maxima, largest first.
    pub fn dominant_frequencies(&self, n: usize) -> Vec<(f64, f64)> {
        find_dominant_frequencies(self, n)
    }

    /// Largest bin within `[low_hz, high_hz]`.
    pub fn peak_in_band(&self, low_hz: f64, high_hz: f64) -> Option<(f64, f64)> {
        find_peak_in_band(self, low_hz, high_hz)
    }

    /// Frequency below which `fraction` of the summed magnitude lies.
    ///
    /// Handy for picking a low-pass cutoff from a PSD.
    pub fn rolloff_frequency(&self, fraction: f64) -> Option<f64> {
        let total: f64 = self.magnitudes.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return None;
        }
        let target = total * fraction.clamp(0.0, 1.0);
        let mut cumulative = 0.0;
        for (f, m) in self.pairs() {
            cumulative += m;
            if cumulative >= target {
                return Some(f);
            }
        }
        self.frequencies.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrum(magnitudes: Vec<f64>) -> Spectrum {
        let frequencies = (1..=magnitudes.len()).map(|k| k as f64 * 0.1).collect();
        Spectrum::new(
            SpectrumKind::Amplitude,
            frequencies,
            magnitudes,
            SampleInterval::from_secs(1).unwrap(),
        )
    }

    #[test]
    fn test_peak_frequency_set_on_construction() {
        let s = spectrum(vec![0.1, 0.9, 0.3, 0.9]);
        // Tie resolves to the lower frequency.
        assert!((s.peak_frequency - 0.2).abs() < 1e-12);
        assert_eq!(s.peak().map(|(_, m)| m), Some(0.9));
    }

    #[test]
    fn test_empty_spectrum() {
        let s = spectrum(vec![]);
        assert!(s.is_empty());
        assert_eq!(s.peak(), None);
        assert_eq!(s.peak_frequency, 0.0);
        assert_eq!(s.rolloff_frequency(0.9), None);
    }

    #[test]
    fn test_rolloff_frequency() {
        let s = spectrum(vec![5.0, 3.0, 1.0, 1.0]);
        assert!((s.rolloff_frequency(0.5).unwrap() - 0.1).abs() < 1e-12);
        assert!((s.rolloff_frequency(0.8).unwrap() - 0.2).abs() < 1e-12);
        assert!((s.rolloff_frequency(1.0).unwrap() - 0.4).abs() < 1e-12);
    }
}
