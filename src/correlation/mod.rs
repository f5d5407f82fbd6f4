//! Correlation analysis - lag estimation and stationarity checks
//!
//! - [`CorrelationEngine::autocorrelation`]: detrended, lag-0 normalized
//! - [`CorrelationEngine::correlate_uniform`]: two arrays already on one grid
//! - [`CorrelationEngine::cross_correlation`]: aligns two sources first, so the
//!   lag unit is the finest native interval
//! - [`adf_test`]: augmented Dickey-Fuller unit-root test

mod correlations;
mod stationarity;

pub use correlations::{AutocorrelationResult, CorrelationEngine, CorrelationResult, LagSpec};
pub use stationarity::{adf_test, mackinnon_p_value, AdfResult, CriticalValues, MIN_ADF_SAMPLES};

use crate::error::Result;

impl CorrelationEngine {
    /// Augmented Dickey-Fuller test on `values`; see [`adf_test`].
    pub fn stationarity(values: &[f64]) -> Result<AdfResult> {
        adf_test(values)
    }
}
