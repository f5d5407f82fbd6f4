//! Real and synthetic signals behind one capability

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::{SyntheticParams, TimeseriesSource, TimeseriesStore};
use crate::error::{AnalysisError, Result};
use crate::types::{Sample, Timeseries};

/// A labeled, already-loaded timeseries.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSeries {
    name: String,
    series: Timeseries,
}

impl NamedSeries {
    pub fn new(name: impl Into<String>, series: Timeseries) -> Self {
        Self {
            name: name.into(),
            series,
        }
    }

    pub fn into_inner(self) -> Timeseries {
        self.series
    }
}

impl TimeseriesSource for NamedSeries {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeseries(&self) -> &Timeseries {
        &self.series
    }
}

/// A sensor signal, tagged by provenance.
///
/// Both variants expose the same [`TimeseriesSource`] capability, so the rest
/// of the pipeline never branches on where the readings came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Readings of a stored sensor entity.
    Real { entity_id: String, series: Timeseries },
    /// Readings generated from parameters.
    Synthetic {
        name: String,
        params: SyntheticParams,
        series: Timeseries,
    },
}

static SENSOR_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^sensor\.[A-Za-z0-9_]+$").expect("valid sensor id regex"));

impl Signal {
    /// Fetch a stored sensor entity.
    ///
    /// Readings marked unavailable (or non-finite) are dropped, and readings
    /// that repeat an earlier timestamp are discarded, so the engine only
    /// receives a valid [`Timeseries`].
    ///
    /// # Errors
    /// - `InvalidEntityId` when `entity_id` is not of the form `sensor.<name>`
    /// - whatever the store reports for unknown entities
    pub fn real(store: &dyn TimeseriesStore, entity_id: &str) -> Result<Self> {
        if !SENSOR_ID.is_match(entity_id) {
            return Err(AnalysisError::InvalidEntityId(entity_id.to_string()));
        }

        let raw = store.fetch(entity_id)?;
        let total = raw.len();
        let mut samples: Vec<Sample> = Vec::with_capacity(total);
        for r in raw {
            let Some(value) = r.value.filter(|v| v.is_finite()) else {
                continue;
            };
            if samples.last().is_some_and(|prev| prev.timestamp >= r.timestamp) {
                continue;
            }
            samples.push(Sample::new(r.timestamp, value));
        }

        let dropped = total - samples.len();
        if dropped > 0 {
            warn!(entity_id, dropped, total, "Dropped unusable readings");
        }
        debug!(entity_id, samples = samples.len(), "Loaded real signal");

        Ok(Signal::Real {
            entity_id: entity_id.to_string(),
            series: Timeseries::new(samples)?,
        })
    }

    /// Generate a virtual sensor.
    pub fn synthetic(name: impl Into<String>, params: SyntheticParams) -> Result<Self> {
        let series = params.generate()?;
        Ok(Signal::Synthetic {
            name: name.into(),
            params,
            series,
        })
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, Signal::Synthetic { .. })
    }

    /// Most recent reading, if any.
    pub fn latest(&self) -> Option<&Sample> {
        self.timeseries().last()
    }
}

impl TimeseriesSource for Signal {
    fn name(&self) -> &str {
        match self {
            Signal::Real { entity_id, .. } => entity_id,
            Signal::Synthetic { name, .. } => name,
        }
    }

    fn timeseries(&self) -> &Timeseries {
        match self {
            Signal::Real { series, .. } | Signal::Synthetic { series, .. } => series,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{InMemoryStore, RawSample};
    use crate::types::SampleInterval;
    use chrono::{DateTime, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
    }

    fn store() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        store.insert(
            "sensor.living_room_temp",
            vec![
                RawSample { timestamp: at(0), value: Some(20.0) },
                RawSample { timestamp: at(60), value: None },
                RawSample { timestamp: at(120), value: Some(21.0) },
                RawSample { timestamp: at(180), value: Some(f64::NAN) },
                RawSample { timestamp: at(240), value: Some(22.0) },
            ],
        );
        store
    }

    #[test]
    fn test_real_signal_drops_unavailable() {
        let signal = Signal::real(&store(), "sensor.living_room_temp").unwrap();
        assert_eq!(signal.name(), "sensor.living_room_temp");
        assert_eq!(signal.timeseries().values(), vec![20.0, 21.0, 22.0]);
        assert_eq!(signal.sample_interval().unwrap().as_secs(), 120);
        assert!(!signal.is_synthetic());
        assert_eq!(signal.latest().map(|s| s.value), Some(22.0));
    }

    #[test]
    fn test_real_signal_rejects_non_sensor_id() {
        assert_eq!(
            Signal::real(&store(), "switch.kettle"),
            Err(AnalysisError::InvalidEntityId("switch.kettle".to_string()))
        );
    }

    #[test]
    fn test_real_signal_unknown_entity() {
        assert_eq!(
            Signal::real(&store(), "sensor.missing"),
            Err(AnalysisError::UnknownEntity("sensor.missing".to_string()))
        );
    }

    #[test]
    fn test_synthetic_signal_same_capability() {
        let params = SyntheticParams::sine(at(0), SampleInterval::from_secs(30).unwrap(), 100, 600.0);
        let signal = Signal::synthetic("virtual.sine", params).unwrap();
        assert!(signal.is_synthetic());
        assert_eq!(signal.name(), "virtual.sine");
        assert_eq!(signal.timeseries().len(), 100);
        assert_eq!(signal.sample_interval().unwrap().as_secs(), 30);
    }

    #[test]
    fn test_entity_id_pattern() {
        for ok in ["sensor.a", "sensor.outdoor_temp_2", "sensor.X1"] {
            assert!(SENSOR_ID.is_match(ok), "{ok}");
        }
        for bad in ["sensor.", "sensor", "light.kitchen", "sensor.a.b", " sensor.a", "sensor.a-b"] {
            assert!(!SENSOR_ID.is_match(bad), "{bad}");
        }
    }
}
