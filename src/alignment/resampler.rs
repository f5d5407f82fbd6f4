//! Single-signal resampling onto a uniform grid
//!
//! The dominant sample interval is the statistical mode of consecutive
//! timestamp differences, rounded to whole seconds. Interior gaps are filled
//! by carrying the last reading forward: event-driven sensors only report on
//! change, so the value is taken as constant until the next update.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::types::{SampleInterval, Timeseries, UniformSignal};

/// How grid points that fall between two readings are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapFill {
    /// Carry the last known reading forward.
    #[default]
    ForwardFill,
    /// Interpolate linearly between the bracketing readings.
    Linear,
}

/// Stateless resampler for one timeseries.
pub struct Resampler;

impl Resampler {
    /// Infer the dominant sample interval of `ts`.
    ///
    /// Ties between equally common spacings resolve to the smaller spacing.
    ///
    /// # Errors
    /// - `InsufficientData` with fewer than two samples
    /// - `DegenerateInterval` when the dominant spacing rounds to 0 s
    pub fn infer_interval(ts: &Timeseries) -> Result<SampleInterval> {
        if ts.len() < 2 {
            return Err(AnalysisError::InsufficientData {
                needed: 2,
                available: ts.len(),
            });
        }

        let mut counts: HashMap<i64, usize> = HashMap::new();
        for w in ts.samples().windows(2) {
            let diff_ms = (w[1].timestamp - w[0].timestamp).num_milliseconds();
            *counts.entry(diff_ms).or_insert(0) += 1;
        }

        let mode_ms = counts
            .into_iter()
            .max_by(|(da, ca), (db, cb)| ca.cmp(cb).then(db.cmp(da)))
            .map(|(diff, _)| diff)
            .unwrap_or(0);

        let seconds = mode_ms as f64 / 1000.0;
        let rounded = seconds.round_ties_even();
        if rounded < 1.0 {
            return Err(AnalysisError::DegenerateInterval { seconds });
        }

        debug!(mode_ms, interval_secs = rounded, "Inferred dominant sample interval");
        SampleInterval::from_secs(rounded as u64)
    }

    /// Resample onto the inferred interval, forward-filling gaps.
    pub fn resample(ts: &Timeseries) -> Result<UniformSignal> {
        Self::resample_with(ts, GapFill::ForwardFill)
    }

    /// Resample onto the inferred interval using the given gap-fill policy.
    pub fn resample_with(ts: &Timeseries, fill: GapFill) -> Result<UniformSignal> {
        let interval = Self::infer_interval(ts)?;
        Self::resample_to(ts, interval, fill)
    }

    /// Resample onto an explicit interval.
    ///
    /// The grid starts at the first reading and stops at the last grid point
    /// not later than the final reading.
    pub fn resample_to(
        ts: &Timeseries,
        interval: SampleInterval,
        fill: GapFill,
    ) -> Result<UniformSignal> {
        let (Some(first), Some(last)) = (ts.first(), ts.last()) else {
            return Err(AnalysisError::EmptyInput("timeseries"));
        };

        let start = first.timestamp;
        let span_ms = (last.timestamp - start).num_milliseconds();
        let step_ms = (interval.as_secs() * 1000) as i64;
        let count = (span_ms / step_ms) as usize + 1;

        let values = (0..count)
            .map(|k| {
                let t = start + interval.offset(k);
                let value = match fill {
                    GapFill::ForwardFill => ts.last_known_at(t),
                    GapFill::Linear => ts.interpolate_at(t),
                };
                // Every grid point lies inside [first, last], so a reading exists.
                value.unwrap_or(first.value)
            })
            .collect();

        debug!(
            input_len = ts.len(),
            output_len = count,
            interval = %interval,
            ?fill,
            "Resampled timeseries"
        );
        UniformSignal::new(start, interval, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn every_30s_with_gap() -> Timeseries {
        // 0, 30, 60, [90 missing], 120, 150, 180
        Timeseries::from_epoch_secs([
            (0, 1.0),
            (30, 2.0),
            (60, 3.0),
            (120, 5.0),
            (150, 6.0),
            (180, 7.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_infer_interval_with_gap() {
        let interval = Resampler::infer_interval(&every_30s_with_gap()).unwrap();
        assert_eq!(interval.as_secs(), 30);
    }

    #[test]
    fn test_infer_interval_rounds_jitter() {
        let ts = Timeseries::from_pairs((0..20).map(|i| {
            let t = DateTime::<Utc>::from_timestamp_millis(i * 29_600).unwrap();
            (t, i as f64)
        }))
        .unwrap();
        assert_eq!(Resampler::infer_interval(&ts).unwrap().as_secs(), 30);
    }

    #[test]
    fn test_infer_interval_tie_prefers_smaller() {
        let ts = Timeseries::from_epoch_secs([(0, 0.0), (10, 0.0), (30, 0.0), (40, 0.0), (60, 0.0)])
            .unwrap();
        // diffs: 10, 20, 10, 20
        assert_eq!(Resampler::infer_interval(&ts).unwrap().as_secs(), 10);
    }

    #[test]
    fn test_single_sample_insufficient() {
        let ts = Timeseries::from_epoch_secs([(0, 1.0)]).unwrap();
        assert_eq!(
            Resampler::infer_interval(&ts),
            Err(AnalysisError::InsufficientData {
                needed: 2,
                available: 1
            })
        );
    }

    #[test]
    fn test_sub_second_interval_degenerate() {
        let ts = Timeseries::from_pairs((0..10).map(|i| {
            let t = DateTime::<Utc>::from_timestamp_millis(i * 200).unwrap();
            (t, 0.0)
        }))
        .unwrap();
        assert!(matches!(
            Resampler::infer_interval(&ts),
            Err(AnalysisError::DegenerateInterval { .. })
        ));
    }

    #[test]
    fn test_resample_forward_fills_gap() {
        let signal = Resampler::resample(&every_30s_with_gap()).unwrap();
        assert_eq!(signal.interval().as_secs(), 30);
        assert_eq!(signal.values(), &[1.0, 2.0, 3.0, 3.0, 5.0, 6.0, 7.0]);
        assert_eq!(signal.end().timestamp(), 180);
    }

    #[test]
    fn test_resample_linear_policy() {
        let signal = Resampler::resample_with(&every_30s_with_gap(), GapFill::Linear).unwrap();
        assert!((signal.values()[3] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_resample_stops_at_last_reading() {
        let ts = Timeseries::from_epoch_secs([(0, 1.0), (30, 2.0), (60, 3.0), (75, 4.0)]).unwrap();
        let signal = Resampler::resample(&ts).unwrap();
        assert_eq!(signal.len(), 3);
        assert_eq!(signal.end().timestamp(), 60);
    }
}
