//! Augmented Dickey-Fuller unit-root test
//!
//! Regression with a constant:
//!
//! ```text
//! Δy_t = α + γ·y_{t-1} + Σ_{i=1..p} φ_i·Δy_{t-i} + ε_t
//! ```
//!
//! The statistic is the t-ratio of `γ`. The augmentation order `p` is picked
//! by AIC over `0..=maxlag` on a common estimation sample, with
//! `maxlag = ceil(12 · (n/100)^(1/4))` (Schwert), then the regression is refit
//! on every usable observation. P-values use MacKinnon's (1994) response
//! surface through `statrs::Normal`; critical values use MacKinnon (2010).

use nalgebra::{Cholesky, DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

use crate::error::{AnalysisError, Result};

/// Fewest observations accepted by [`adf_test`].
pub const MIN_ADF_SAMPLES: usize = 10;

// MacKinnon (1994) response surface, constant-only regression, one series.
const TAU_MAX: f64 = 2.74;
const TAU_MIN: f64 = -18.83;
const TAU_STAR: f64 = -1.61;
const TAU_SMALLP: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_LARGEP: [f64; 4] = [1.7339, 0.093202, -0.012745, -0.00010368];

// MacKinnon (2010) critical value polynomials in 1/T.
const CRIT_1PCT: [f64; 4] = [-3.43035, -6.5393, -16.786, -79.433];
const CRIT_5PCT: [f64; 4] = [-2.86154, -2.8903, -4.234, -40.04];
const CRIT_10PCT: [f64; 4] = [-2.56677, -1.5384, -2.809, 0.0];

/// Relative pivot below which a regressor is treated as collinear.
const RANK_TOLERANCE: f64 = 1e-10;

/// ADF critical values at the usual significance levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalValues {
    pub one_percent: f64,
    pub five_percent: f64,
    pub ten_percent: f64,
}

impl CriticalValues {
    fn for_nobs(nobs: usize) -> Self {
        let inv = 1.0 / nobs as f64;
        Self {
            one_percent: polyval(&CRIT_1PCT, inv),
            five_percent: polyval(&CRIT_5PCT, inv),
            ten_percent: polyval(&CRIT_10PCT, inv),
        }
    }
}

/// Outcome of an augmented Dickey-Fuller test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdfResult {
    /// t-ratio of the lagged level coefficient
    pub statistic: f64,
    /// MacKinnon approximate p-value
    pub p_value: f64,
    /// Augmentation order chosen by AIC
    pub used_lag: usize,
    /// Observations in the final regression
    pub n_obs: usize,
    pub critical_values: CriticalValues,
}

impl AdfResult {
    /// Unit root rejected at significance `alpha`.
    pub fn is_stationary(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Run the augmented Dickey-Fuller test on `values`.
///
/// # Errors
/// - `InsufficientData` for fewer than [`MIN_ADF_SAMPLES`] values
/// - `NonFiniteValue` for NaN or infinite input
/// - `InvalidParameter` when no lag order gives a full-rank regression
///   (e.g. a constant series)
pub fn adf_test(values: &[f64]) -> Result<AdfResult> {
    let n = values.len();
    if n < MIN_ADF_SAMPLES {
        return Err(AnalysisError::InsufficientData {
            needed: MIN_ADF_SAMPLES,
            available: n,
        });
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(AnalysisError::NonFiniteValue { index });
    }

    let diffs: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
    let max_lag = schwert.min(n / 2 - 2);

    // AIC search on the sample usable by the longest lag.
    let mut best: Option<(usize, f64)> = None;
    for lag in 0..=max_lag {
        let (x, y) = design(values, &diffs, lag, max_lag);
        let Some(fit) = ols(&x, &y) else { continue };
        let aic = fit.aic();
        if best.map_or(true, |(_, best_aic)| aic < best_aic) {
            best = Some((lag, aic));
        }
    }
    let (used_lag, _) = best.ok_or_else(|| {
        AnalysisError::InvalidParameter("ADF regression is singular for every lag order".to_string())
    })?;

    let (x, y) = design(values, &diffs, used_lag, used_lag);
    let fit = ols(&x, &y).ok_or_else(|| {
        AnalysisError::InvalidParameter(format!("ADF regression is singular at lag {used_lag}"))
    })?;

    let gamma = fit.beta[1];
    let se = fit.std_errors[1];
    let statistic = if se > 0.0 {
        gamma / se
    } else if gamma < 0.0 {
        f64::NEG_INFINITY
    } else if gamma > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };
    let n_obs = y.len();
    let p_value = mackinnon_p_value(statistic);

    debug!(statistic, p_value, used_lag, max_lag, n_obs, "ADF test");
    Ok(AdfResult {
        statistic,
        p_value,
        used_lag,
        n_obs,
        critical_values: CriticalValues::for_nobs(n_obs),
    })
}

/// MacKinnon (1994) approximate p-value for a constant-only ADF statistic.
pub fn mackinnon_p_value(statistic: f64) -> f64 {
    if statistic.is_nan() {
        return 1.0;
    }
    if statistic > TAU_MAX {
        return 1.0;
    }
    if statistic < TAU_MIN {
        return 0.0;
    }

    let z = if statistic <= TAU_STAR {
        polyval(&TAU_SMALLP, statistic)
    } else {
        polyval(&TAU_LARGEP, statistic)
    };

    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.cdf(z),
        Err(_) => 1.0,
    }
}

/// `c[0] + c[1]·x + c[2]·x² + ...`
fn polyval(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Regressors `[1, y_{t-1}, Δy_{t-1} .. Δy_{t-lag}]` and target `Δy_t`,
/// starting at difference index `start >= lag`.
fn design(levels: &[f64], diffs: &[f64], lag: usize, start: usize) -> (DMatrix<f64>, DVector<f64>) {
    let rows = diffs.len() - start;
    let x = DMatrix::from_fn(rows, 2 + lag, |r, c| {
        let j = start + r;
        match c {
            0 => 1.0,
            1 => levels[j],
            i => diffs[j - (i - 1)],
        }
    });
    let y = DVector::from_fn(rows, |r, _| diffs[start + r]);
    (x, y)
}

struct OlsFit {
    beta: DVector<f64>,
    std_errors: Vec<f64>,
    ssr: f64,
    nobs: usize,
}

impl OlsFit {
    /// Gaussian log-likelihood AIC.
    fn aic(&self) -> f64 {
        let n = self.nobs as f64;
        let llf = -0.5 * n * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0);
        -2.0 * llf + 2.0 * self.beta.len() as f64
    }
}

/// Least squares through QR, standard errors from the Cholesky inverse of
/// `XᵀX`. `None` when there are no residual degrees of freedom or a
/// regressor is (numerically) collinear with the ones before it.
fn ols(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<OlsFit> {
    let (m, k) = x.shape();
    if m <= k {
        return None;
    }

    let qr = x.clone().qr();
    let r = qr.r();
    for j in 0..k {
        let col_norm = x.column(j).norm();
        if col_norm == 0.0 || r[(j, j)].abs() <= RANK_TOLERANCE * col_norm {
            return None;
        }
    }

    let qty = qr.q().tr_mul(y);
    let beta = r.solve_upper_triangular(&qty)?;
    let ssr = (y - x * &beta).norm_squared();

    let xtx_inv = Cholesky::new(x.tr_mul(x))?.inverse();
    let sigma_sq = ssr / (m - k) as f64;
    let std_errors = xtx_inv
        .diagonal()
        .iter()
        .map(|d| (sigma_sq * d).sqrt())
        .collect();

    Some(OlsFit {
        beta,
        std_errors,
        ssr,
        nobs: m,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal as NormalDist};
    use std::f64::consts::PI;

    #[test]
    fn test_zero_noise_sine_is_stationary() {
        let values: Vec<f64> = (0..200).map(|k| (2.0 * PI * k as f64 / 20.0).sin()).collect();
        let result = adf_test(&values).unwrap();
        assert!(result.p_value < 0.05, "p = {}", result.p_value);
        assert!(result.is_stationary(0.05));
    }

    #[test]
    fn test_white_noise_is_stationary() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let dist = NormalDist::new(0.0, 1.0).unwrap();
        let values: Vec<f64> = (0..500).map(|_| dist.sample(&mut rng)).collect();
        let result = adf_test(&values).unwrap();
        assert!(result.statistic < result.critical_values.one_percent);
        assert!(result.p_value < 0.01, "p = {}", result.p_value);
    }

    #[test]
    fn test_explosive_series_not_stationary() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let dist = NormalDist::new(0.0, 0.1).unwrap();
        let mut level = 10.0;
        let values: Vec<f64> = (0..200)
            .map(|_| {
                level = 1.01 * level + dist.sample(&mut rng);
                level
            })
            .collect();
        let result = adf_test(&values).unwrap();
        assert!(result.statistic > 0.0);
        assert!(result.p_value > 0.5, "p = {}", result.p_value);
        assert!(!result.is_stationary(0.05));
    }

    #[test]
    fn test_too_few_samples() {
        assert_eq!(
            adf_test(&[1.0, 2.0, 1.5, 3.0, 2.0, 2.5, 1.0, 0.5, 2.0]),
            Err(AnalysisError::InsufficientData {
                needed: 10,
                available: 9
            })
        );
    }

    #[test]
    fn test_constant_series_rejected() {
        assert!(matches!(
            adf_test(&[4.0; 50]),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_mackinnon_p_value_bounds() {
        assert_eq!(mackinnon_p_value(3.0), 1.0);
        assert_eq!(mackinnon_p_value(-20.0), 0.0);
        assert_eq!(mackinnon_p_value(f64::NEG_INFINITY), 0.0);
        // Near the 5% critical value for large samples.
        let p = mackinnon_p_value(-2.86);
        assert!((p - 0.05).abs() < 0.01, "p = {p}");
        let p = mackinnon_p_value(-3.43);
        assert!((p - 0.01).abs() < 0.005, "p = {p}");
        assert!(mackinnon_p_value(-1.0) > mackinnon_p_value(-2.0));
    }

    #[test]
    fn test_critical_values_large_sample() {
        let cv = CriticalValues::for_nobs(100_000);
        assert!((cv.one_percent + 3.43035).abs() < 1e-3);
        assert!((cv.five_percent + 2.86154).abs() < 1e-3);
        assert!((cv.ten_percent + 2.56677).abs() < 1e-3);
    }

    #[test]
    fn test_ols_recovers_coefficients() {
        let x = DMatrix::from_fn(20, 2, |i, j| if j == 0 { 1.0 } else { i as f64 });
        let y = DVector::from_fn(20, |i, _| {
            3.0 - 0.5 * i as f64 + if i % 2 == 0 { 0.1 } else { -0.1 }
        });
        let fit = ols(&x, &y).unwrap();
        assert!((fit.beta[0] - 3.0).abs() < 0.1);
        assert!((fit.beta[1] + 0.5).abs() < 0.01);
        assert!(fit.std_errors.iter().all(|s| *s > 0.0));
        assert_eq!(fit.nobs, 20);
    }

    #[test]
    fn test_ols_collinear_regressors_are_singular() {
        // Third column is twice the second.
        let x = DMatrix::from_fn(15, 3, |i, j| match j {
            0 => 1.0,
            1 => i as f64,
            _ => 2.0 * i as f64,
        });
        let y = DVector::from_fn(15, |i, _| (i as f64).sin());
        assert!(ols(&x, &y).is_none());

        let zero = DMatrix::from_fn(15, 2, |_, j| if j == 0 { 1.0 } else { 0.0 });
        assert!(ols(&zero, &y).is_none());
    }

    #[test]
    fn test_ols_needs_residual_degrees_of_freedom() {
        let x = DMatrix::from_fn(2, 2, |i, j| if j == 0 { 1.0 } else { i as f64 });
        let y = DVector::from_vec(vec![1.0, 2.0]);
        assert!(ols(&x, &y).is_none());
    }
}
