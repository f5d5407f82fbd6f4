//! Signal sources
//!
//! Anything that can hand the engine a [`Timeseries`] and its inferred
//! [`SampleInterval`] implements [`TimeseriesSource`]. The aligner and the
//! correlation engine only see that capability, never where the data came
//! from.
//!
//! - [`Signal::Real`]: readings for a storage entity, fetched through a
//!   [`TimeseriesStore`]
//! - [`Signal::Synthetic`]: generated from [`SyntheticParams`]
//! - [`NamedSeries`]: an already-loaded series with a label
//! - [`csv`]: `timestamp,value` file ingestion

pub mod csv;
mod signal;
mod store;
mod synthetic;

pub use signal::{NamedSeries, Signal};
pub use store::{InMemoryStore, RawSample, TimeseriesStore};
pub use synthetic::SyntheticParams;
pub use csv::SourceError;

use crate::alignment::Resampler;
use crate::error::Result;
use crate::types::{SampleInterval, Timeseries};

/// Capability shared by every signal source.
pub trait TimeseriesSource: Send + Sync {
    /// Label used for the source's column after alignment.
    fn name(&self) -> &str;

    fn timeseries(&self) -> &Timeseries;

    /// Dominant sample interval of [`Self::timeseries`].
    fn sample_interval(&self) -> Result<SampleInterval> {
        Resampler::infer_interval(self.timeseries())
    }
}
