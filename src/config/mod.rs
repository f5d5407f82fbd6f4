//! Analysis Configuration Module
//!
//! Pipeline parameters loaded from TOML. Every field has a default, so the
//! engine runs unchanged with no file present.
//!
//! ## Loading Order
//!
//! 1. `SIGPROC_CONFIG` environment variable (path to TOML file)
//! 2. `sigproc.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Library calls take their parameters explicitly. A binary loads the config
//! once and passes the relevant fields down:
//!
//! ```ignore
//! let cfg = AnalysisConfig::load();
//! let filtered = signal.lowpass(cutoff_hz, cfg.filter.order)?;
//! ```

mod analysis_config;
pub mod defaults;
pub mod validation;

pub use analysis_config::*;
pub use validation::{validate_unknown_keys, ValidationWarning};
