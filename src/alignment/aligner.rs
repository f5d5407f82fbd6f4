//! Multi-signal alignment onto the finest common interval
//!
//! Each input keeps its own inferred interval until alignment; the aligner then
//! picks the smallest one, restricts every signal to the window where all of
//! them have data, and interpolates linearly between real readings. Coarser
//! signals are therefore upsampled rather than finer ones decimated.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::AlignedMatrix;
use crate::error::{AnalysisError, Result};
use crate::sources::TimeseriesSource;
use crate::types::SampleInterval;

/// Stateless multi-signal aligner.
pub struct Aligner;

impl Aligner {
    /// Align `sources` over their common overlap window.
    pub fn align(sources: &[&dyn TimeseriesSource]) -> Result<AlignedMatrix> {
        Self::align_from(sources, None)
    }

    /// Align `sources`, optionally anchoring the window start at
    /// `earliest_time` instead of the latest first reading.
    ///
    /// # Errors
    /// - `InsufficientData` for fewer than two sources, or a source whose
    ///   interval cannot be inferred
    /// - `EmptyInput` when a source has no readings
    /// - `DegenerateInterval` when a source's spacing rounds to 0 s
    /// - `NoOverlap` when the window start is not before its end
    /// - `DuplicateSignalName` when two sources share a name
    pub fn align_from(
        sources: &[&dyn TimeseriesSource],
        earliest_time: Option<DateTime<Utc>>,
    ) -> Result<AlignedMatrix> {
        if sources.len() < 2 {
            return Err(AnalysisError::InsufficientData {
                needed: 2,
                available: sources.len(),
            });
        }

        let mut seen = HashSet::with_capacity(sources.len());
        if let Some(dup) = sources.iter().map(|s| s.name()).find(|name| !seen.insert(*name)) {
            return Err(AnalysisError::DuplicateSignalName(dup.to_string()));
        }
        Self::align_positional(sources, earliest_time)
    }

    /// Alignment without the unique-name check, for callers that read
    /// columns by index (e.g. correlating a signal with itself).
    pub(crate) fn align_positional(
        sources: &[&dyn TimeseriesSource],
        earliest_time: Option<DateTime<Utc>>,
    ) -> Result<AlignedMatrix> {
        if sources.len() < 2 {
            return Err(AnalysisError::InsufficientData {
                needed: 2,
                available: sources.len(),
            });
        }

        let interval = Self::common_interval(sources)?;
        let (overlap_start, end) = Self::overlap_window(sources)?;
        let start = earliest_time.unwrap_or(overlap_start);
        if start >= end {
            return Err(AnalysisError::NoOverlap { start, end });
        }

        let step_ms = (interval.as_secs() * 1000) as i64;
        let rows = ((end - start).num_milliseconds() / step_ms) as usize + 1;

        let columns = sources
            .iter()
            .map(|source| {
                let ts = source.timeseries();
                (0..rows)
                    .map(|k| {
                        ts.interpolate_at(start + interval.offset(k))
                            .ok_or(AnalysisError::EmptyInput("timeseries"))
                    })
                    .collect::<Result<Vec<f64>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        let names = sources.iter().map(|s| s.name().to_string()).collect();

        debug!(
            signals = sources.len(),
            rows,
            interval = %interval,
            start = %start,
            end = %end,
            "Aligned signals onto common grid"
        );
        AlignedMatrix::new(start, interval, names, columns)
    }

    /// Smallest inferred interval across `sources`.
    pub fn common_interval(sources: &[&dyn TimeseriesSource]) -> Result<SampleInterval> {
        let mut common: Option<SampleInterval> = None;
        for source in sources {
            let interval = source.sample_interval()?;
            debug!(source = source.name(), interval = %interval, "Source interval");
            common = Some(common.map_or(interval, |c| c.min(interval)));
        }
        common.ok_or(AnalysisError::EmptyInput("sources"))
    }

    /// `[max(first timestamps), min(last timestamps)]` across `sources`.
    ///
    /// Not validated: the returned start may be at or after the end.
    pub fn overlap_window(
        sources: &[&dyn TimeseriesSource],
    ) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let mut window: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
        for source in sources {
            let ts = source.timeseries();
            let (Some(first), Some(last)) = (ts.first(), ts.last()) else {
                return Err(AnalysisError::EmptyInput("timeseries"));
            };
            window = Some(match window {
                None => (first.timestamp, last.timestamp),
                Some((s, e)) => (s.max(first.timestamp), e.min(last.timestamp)),
            });
        }
        window.ok_or(AnalysisError::EmptyInput("sources"))
    }
}
