//! Pipeline Regression Tests
//!
//! Runs the full chain (resample, align, filter, spectra, correlation,
//! stationarity) on synthetic sensors whose delays and frequencies are known,
//! and asserts the engine recovers them.

use chrono::{DateTime, Utc};
use sensor_sigproc::correlation::{CorrelationEngine, LagSpec};
use sensor_sigproc::processing::{
    detrend, fourier_spectrum, lowpass, power_spectral_density, signal_to_noise,
};
use sensor_sigproc::sources::{NamedSeries, Signal, SyntheticParams, TimeseriesSource};
use sensor_sigproc::{AnalysisError, Aligner, Resampler, SampleInterval};

fn t0() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
}

fn secs(s: u64) -> SampleInterval {
    SampleInterval::from_secs(s).unwrap()
}

/// 30 s reference sensor and a 90 s sensor seeing the same waveform 200 s
/// later, both spanning roughly 8.3 hours.
fn delayed_pair() -> (NamedSeries, NamedSeries) {
    let reference = SyntheticParams::sine(t0(), secs(30), 1001, 2000.0)
        .generate()
        .unwrap();
    let delayed = SyntheticParams::sine(t0(), secs(90), 334, 2000.0)
        .with_delay(200.0)
        .generate()
        .unwrap();
    (
        NamedSeries::new("reference", reference),
        NamedSeries::new("delayed", delayed),
    )
}

// ============================================================================
// Cross-correlation
// ============================================================================

#[test]
fn coarse_delayed_signal_peak_lag_in_seconds() {
    let (a, b) = delayed_pair();
    let result = CorrelationEngine::cross_correlation(&a, &b, LagSpec::Absolute(50)).unwrap();

    assert_eq!(result.len(), 101);
    assert_eq!(result.lags.first(), Some(&-50));
    assert_eq!(result.lags.last(), Some(&50));
    // Lag unit is the aligned (finer) interval, not the coarse one.
    assert_eq!(result.interval, secs(30));

    let delay = result.peak_lag_seconds();
    assert!((delay - 200.0).abs() <= 30.0, "estimated delay {delay} s");
    assert!(result.peak().unwrap().1 > 0.9);
}

#[test]
fn default_lag_window_is_three_quarters_of_aligned_length() {
    let (a, b) = delayed_pair();
    let result = CorrelationEngine::cross_correlation(&a, &b, LagSpec::default()).unwrap();
    // 1000 aligned rows -> L = 750
    assert_eq!(result.max_lag(), 750);
    assert_eq!(result.len(), 1501);
}

#[test]
fn full_percentage_is_rejected() {
    let (a, b) = delayed_pair();
    assert_eq!(
        CorrelationEngine::cross_correlation(&a, &b, LagSpec::Percentage(100.0)),
        Err(AnalysisError::InvalidLagPercentage(100.0))
    );
}

#[test]
fn lag_beyond_aligned_length_is_rejected() {
    let (a, b) = delayed_pair();
    assert!(matches!(
        CorrelationEngine::cross_correlation(&a, &b, LagSpec::Absolute(1000)),
        Err(AnalysisError::InvalidLag { lag: 1000, .. })
    ));
}

#[test]
fn batch_pairs_match_single_runs() {
    let (a, b) = delayed_pair();
    let c = NamedSeries::new(
        "noisy_delayed",
        SyntheticParams::sine(t0(), secs(60), 500, 2000.0)
            .with_delay(200.0)
            .with_noise(0.1, 11)
            .generate()
            .unwrap(),
    );

    let pairs: [(&dyn TimeseriesSource, &dyn TimeseriesSource); 2] = [(&a, &b), (&a, &c)];
    let results = CorrelationEngine::analyze_pairs(&pairs, LagSpec::Absolute(30));

    let single = CorrelationEngine::cross_correlation(&a, &b, LagSpec::Absolute(30)).unwrap();
    assert_eq!(results[0].as_ref().unwrap(), &single);
    let noisy_delay = results[1].as_ref().unwrap().peak_lag_seconds();
    assert!((noisy_delay - 200.0).abs() <= 60.0, "noisy delay {noisy_delay} s");
}

// ============================================================================
// Filtering and spectra
// ============================================================================

#[test]
fn detrended_signal_has_zero_mean() {
    let signal = Signal::synthetic(
        "drifting",
        SyntheticParams::sine(t0(), secs(30), 500, 3000.0)
            .with_trend(0.001)
            .with_noise(0.2, 5),
    )
    .unwrap();
    let uniform = Resampler::resample(signal.timeseries()).unwrap();
    let detrended = detrend(uniform.values()).unwrap();
    let mean = detrended.iter().sum::<f64>() / detrended.len() as f64;
    assert!(mean.abs() < 1e-9);
}

#[test]
fn lowpass_preserves_timing_of_slow_component() {
    let mut params = SyntheticParams::sine(t0(), secs(30), 1000, 3000.0);
    params.noise_std = 0.3;
    params.seed = 21;
    let noisy = Resampler::resample(&params.generate().unwrap()).unwrap();

    // Nyquist is 1/60 Hz; keep the 3000 s period, drop the noise.
    let filtered = noisy.lowpass(1.0 / 1000.0, 5).unwrap();
    assert_eq!(filtered.len(), noisy.len());
    assert_eq!(filtered.start(), noisy.start());

    let clean = SyntheticParams::sine(t0(), secs(30), 1000, 3000.0)
        .generate()
        .unwrap()
        .values();
    let xcorr =
        CorrelationEngine::correlate_uniform(&clean, filtered.values(), secs(30), 20).unwrap();
    assert_eq!(xcorr.peak_lag(), 0);
    assert!(xcorr.peak().unwrap().1 > 0.9);
}

#[test]
fn spectrum_and_psd_find_the_injected_period() {
    // 50-sample period at 30 s -> 1 / 1500 Hz
    let values = SyntheticParams::sine(t0(), secs(30), 1000, 1500.0)
        .generate()
        .unwrap()
        .values();

    let spectrum = fourier_spectrum(&values, secs(30)).unwrap();
    assert!(spectrum.frequencies.iter().all(|&f| f > 0.0));
    assert!((spectrum.peak_frequency - 1.0 / 1500.0).abs() < 1e-12);

    let psd = power_spectral_density(&values, secs(30)).unwrap();
    assert_eq!(psd.frequencies[0], 0.0);
    assert!((psd.peak_frequency - 1.0 / 1500.0).abs() < 1e-12);
    let top = psd.dominant_frequencies(1);
    assert!((top[0].0 - 1.0 / 1500.0).abs() < 1e-12);

    // All the power sits in one bin, so the suggested cutoff is that bin.
    let cutoff = psd.rolloff_frequency(0.95).unwrap();
    assert!((cutoff - 1.0 / 1500.0).abs() < 1e-12);
    assert!(lowpass(&values, 2.0 * cutoff, secs(30), 5).is_ok());
}

#[test]
fn filter_rejects_cutoff_above_nyquist() {
    let values = vec![0.0; 100];
    assert!(matches!(
        lowpass(&values, 1.0 / 30.0, secs(30), 5),
        Err(AnalysisError::InvalidFilterParameters(_))
    ));
}

#[test]
fn signal_to_noise_is_best_effort() {
    assert_eq!(signal_to_noise(&[], true), 0.0);
    assert_eq!(signal_to_noise(&[1.5; 40], false), 0.0);
    let offset: Vec<f64> = (0..100).map(|k| 10.0 + (k as f64 * 0.5).sin()).collect();
    assert!(signal_to_noise(&offset, false) > 5.0);
}

// ============================================================================
// Stationarity
// ============================================================================

#[test]
fn zero_noise_sine_is_stationary() {
    let values = SyntheticParams::sine(t0(), secs(30), 400, 1200.0)
        .generate()
        .unwrap()
        .values();
    let adf = CorrelationEngine::stationarity(&values).unwrap();
    assert!(adf.p_value < 0.05, "p = {}", adf.p_value);
    assert!(adf.critical_values.one_percent < adf.critical_values.five_percent);
    assert!(adf.critical_values.five_percent < adf.critical_values.ten_percent);
}

#[test]
fn aligned_columns_feed_every_stage() {
    let (a, b) = delayed_pair();
    let m = Aligner::align(&[&a, &b]).unwrap();
    let delayed = m.signal("delayed").unwrap();

    let filtered = delayed.lowpass_default(1.0 / 600.0).unwrap();
    let acf = CorrelationEngine::autocorrelation(filtered.values(), 100).unwrap();
    assert_eq!(acf.values.len(), 101);
    assert!((acf.values[0] - 1.0).abs() < 1e-12);

    let spectrum = power_spectral_density(filtered.values(), filtered.interval()).unwrap();
    assert!((spectrum.peak_frequency - 1.0 / 2000.0).abs() < 1.0 / 30_000.0 + 1e-12);
}
