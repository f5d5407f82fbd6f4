//! Analysis configuration - every tunable of the pipeline as TOML
//!
//! Each section implements `Default` with the values in [`super::defaults`],
//! so an absent file and an empty file behave identically.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults::{
    CONFIG_ENV_VAR, DEFAULT_FILTER_ORDER, DEFAULT_LAG_PERCENTAGE, DEFAULT_SIGNIFICANCE,
    DEFAULT_TRAIN_FRACTION, LOCAL_CONFIG_FILE, MAX_FILTER_ORDER,
};
use crate::alignment::GapFill;
use crate::correlation::LagSpec;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for an analysis run.
///
/// Load with `AnalysisConfig::load()` which searches:
/// 1. `$SIGPROC_CONFIG` env var
/// 2. `./sigproc.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Low-pass filter design
    #[serde(default)]
    pub filter: FilterConfig,

    /// Cross-correlation and stationarity
    #[serde(default)]
    pub correlation: CorrelationConfig,

    /// Resampling gap policy
    #[serde(default)]
    pub alignment: AlignmentConfig,

    /// Train/test hand-off to model fitting
    #[serde(default)]
    pub split: SplitConfig,
}

impl AnalysisConfig {
    /// Load configuration using the standard search order:
    /// 1. `$SIGPROC_CONFIG` environment variable
    /// 2. `./sigproc.toml` in the current working directory
    /// 3. Built-in defaults
    ///
    /// A file that fails to parse or validate is logged and skipped.
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded analysis config from {CONFIG_ENV_VAR}");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {CONFIG_ENV_VAR}, falling back");
                    }
                }
            } else {
                warn!(path = %path, "{CONFIG_ENV_VAR} points to non-existent file, falling back");
            }
        }

        // 2. Check ./sigproc.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded analysis config from ./{LOCAL_CONFIG_FILE}");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{LOCAL_CONFIG_FILE}, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No {LOCAL_CONFIG_FILE} found, using built-in defaults");
        Self::default()
    }

    /// Load and validate a specific TOML file.
    ///
    /// Unknown keys only produce warnings.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Analysis config saved");
        Ok(())
    }

    /// Lag window for cross-correlation: `max_lag` when set, otherwise the
    /// percentage.
    pub fn lag_spec(&self) -> LagSpec {
        match self.correlation.max_lag {
            Some(lag) => LagSpec::Absolute(lag),
            None => LagSpec::Percentage(self.correlation.lag_percentage),
        }
    }

    /// Validate every section, reporting all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let f = &self.filter;
        if f.order == 0 || f.order > MAX_FILTER_ORDER {
            errors.push(format!(
                "filter.order = {} must lie in 1..={MAX_FILTER_ORDER}",
                f.order
            ));
        }
        if let Some(cutoff) = f.cutoff_hz {
            // NaN/Inf comparisons silently pass, catch them explicitly
            if !cutoff.is_finite() || cutoff <= 0.0 {
                errors.push(format!("filter.cutoff_hz = {cutoff} must be a positive frequency"));
            }
        }

        let c = &self.correlation;
        if !c.lag_percentage.is_finite() || !(0.0..100.0).contains(&c.lag_percentage) {
            errors.push(format!(
                "correlation.lag_percentage = {} must lie in [0, 100)",
                c.lag_percentage
            ));
        }
        if !(c.significance > 0.0 && c.significance < 1.0) {
            errors.push(format!(
                "correlation.significance = {} must lie strictly between 0 and 1",
                c.significance
            ));
        }

        let s = &self.split;
        if !(s.train_fraction > 0.0 && s.train_fraction < 1.0) {
            errors.push(format!(
                "split.train_fraction = {} must lie strictly between 0 and 1",
                s.train_fraction
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Sections
// ============================================================================

/// `[filter]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Butterworth order
    pub order: usize,
    /// Low-pass cutoff in Hz; no filtering when unset
    pub cutoff_hz: Option<f64>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_FILTER_ORDER,
            cutoff_hz: None,
        }
    }
}

/// `[correlation]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Lag window as a percentage of the aligned length
    pub lag_percentage: f64,
    /// Absolute lag window in samples; overrides `lag_percentage`
    pub max_lag: Option<usize>,
    /// Significance level for the stationarity verdict
    pub significance: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            lag_percentage: DEFAULT_LAG_PERCENTAGE,
            max_lag: None,
            significance: DEFAULT_SIGNIFICANCE,
        }
    }
}

/// `[alignment]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Gap policy when resampling a single signal
    pub gap_fill: GapFill,
}

/// `[split]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Share of rows used for training
    pub train_fraction: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: DEFAULT_TRAIN_FRACTION,
        }
    }
}
