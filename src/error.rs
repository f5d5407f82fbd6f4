//! Error taxonomy for the analysis engine.
//!
//! Every variant is raised at the boundary of the operation that detects it.
//! These are deterministic numeric failures, so nothing in the crate retries.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised by resampling, alignment, filtering and correlation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Insufficient data: need {needed}, have {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("Degenerate sample interval: dominant spacing of {seconds:.3}s rounds to 0s")]
    DegenerateInterval { seconds: f64 },

    #[error("No overlapping time window: start {start} is not before end {end}")]
    NoOverlap {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Invalid filter parameters: {0}")]
    InvalidFilterParameters(String),

    #[error("Invalid lag: requested {lag}, only {available} available")]
    InvalidLag { lag: usize, available: usize },

    #[error("Invalid lag percentage {0}: must lie in [0, 100)")]
    InvalidLagPercentage(f64),

    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    #[error("Timestamps must be strictly increasing (violation at index {index})")]
    UnorderedTimestamps { index: usize },

    #[error("Timestamp {0} is out of range")]
    InvalidTimestamp(i64),

    #[error("Non-finite value at index {index}")]
    NonFiniteValue { index: usize },

    #[error("Invalid train fraction {0}: must lie strictly between 0 and 1")]
    InvalidSplit(f64),

    #[error("Invalid entity id '{0}': expected 'sensor.<name>'")]
    InvalidEntityId(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("Duplicate signal name '{0}': aligned columns must be uniquely named")]
    DuplicateSignalName(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AnalysisError>;
