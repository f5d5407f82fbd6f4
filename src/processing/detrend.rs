//! Linear least-squares detrending

use crate::error::{AnalysisError, Result};

/// Least-squares line `intercept + slope * k` through `values` indexed by
/// sample number `k`. Returns `(slope, intercept)`.
pub fn linear_fit(values: &[f64]) -> Result<(f64, f64)> {
    let n = values.len();
    if n == 0 {
        return Err(AnalysisError::EmptyInput("signal"));
    }

    let nf = n as f64;
    let x_mean = (nf - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / nf;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (k, &y) in values.iter().enumerate() {
        let dx = k as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }

    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    let intercept = y_mean - slope * x_mean;
    Ok((slope, intercept))
}

/// Subtract the least-squares line from `values`.
///
/// The fitted line passes through the data mean, so the result has zero mean
/// up to rounding. This is not mean subtraction: a pure ramp detrends to zero.
pub fn detrend(values: &[f64]) -> Result<Vec<f64>> {
    let (slope, intercept) = linear_fit(values)?;
    Ok(values
        .iter()
        .enumerate()
        .map(|(k, &y)| y - (intercept + slope * k as f64))
        .collect())
}

/// Arithmetic mean; 0 for an empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (ddof = 0); 0 for an empty slice.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}
