//! sensor-sigproc: Sensor Timeseries Alignment and Spectral/Correlation Analysis
//!
//! Prepares irregularly sampled, multi-rate sensor readings for system
//! identification: signals are put on one uniform time base, then checked and
//! filtered in the frequency and lag domains before model fitting.
//!
//! ## Pipeline
//!
//! - **Resampler**: one irregular series onto its dominant interval (gaps forward-filled)
//! - **Aligner**: many series onto the finest common interval over their overlap
//! - **Processing**: detrending, zero-phase Butterworth low-pass, FFT spectra and PSD
//! - **Correlation**: autocorrelation, cross-correlation with peak-lag in
//!   seconds, ADF stationarity
//!
//! Every stage is a pure transform of immutable values.

pub mod alignment;
pub mod config;
pub mod correlation;
pub mod error;
pub mod processing;
pub mod sources;
pub mod types;

// Re-export configuration
pub use config::AnalysisConfig;

// Re-export error types
pub use error::{AnalysisError, Result};

// Re-export commonly used types
pub use types::{Sample, SampleInterval, Timeseries, UniformSignal};

// Re-export pipeline stages
pub use alignment::{AlignedMatrix, Aligner, GapFill, Resampler};
pub use correlation::{AdfResult, AutocorrelationResult, CorrelationEngine, CorrelationResult, LagSpec};
pub use processing::{
    detrend, fourier_spectrum, lowpass, power_spectral_density, signal_to_noise, Spectrum,
    SpectrumKind,
};

// Re-export signal sources
pub use sources::{InMemoryStore, NamedSeries, Signal, SyntheticParams, TimeseriesSource, TimeseriesStore};
