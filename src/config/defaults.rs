//! Default analysis parameters.
//!
//! Grouped by stage so call sites and [`super::AnalysisConfig`] share one
//! source of truth.

// ============================================================================
// Filtering
// ============================================================================

/// Butterworth low-pass order.
pub const DEFAULT_FILTER_ORDER: usize = 5;

/// Highest accepted filter order. Higher orders lose precision in the
/// cascaded sections without sharpening the response usefully.
pub const MAX_FILTER_ORDER: usize = 16;

/// Share of spectral mass below the suggested low-pass cutoff.
pub const CUTOFF_ROLLOFF_FRACTION: f64 = 0.95;

// ============================================================================
// Correlation
// ============================================================================

/// Cross-correlation lag window as a percentage of the aligned length.
pub const DEFAULT_LAG_PERCENTAGE: f64 = 75.0;

/// Significance level for the ADF stationarity verdict.
pub const DEFAULT_SIGNIFICANCE: f64 = 0.05;

// ============================================================================
// Model-fitting hand-off
// ============================================================================

/// Share of an aligned matrix kept for training; the rest is the test split.
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.8;

// ============================================================================
// Config file discovery
// ============================================================================

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "SIGPROC_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "sigproc.toml";
