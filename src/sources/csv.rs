//! Sensor readings from CSV files
//!
//! Expected format, one reading per line:
//!
//! ```text
//! timestamp,value
//! 2024-01-18T08:00:00Z,21.5
//! 1705564830,21.6
//! ```
//!
//! Timestamps are RFC 3339 or Unix epoch seconds. Values that storage marks as
//! missing (`unavailable`, `unknown`, empty) are dropped, as are lines that
//! fail to parse.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::{NamedSeries, RawSample};
use crate::error::AnalysisError;
use crate::types::{Sample, Timeseries};

/// Errors while loading readings from disk.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No usable readings in {0}")]
    Empty(PathBuf),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Markers storage uses for readings with no numeric value.
const MISSING_MARKERS: &[&str] = &["", "unavailable", "unknown", "none", "null", "nan"];

/// Read raw `(timestamp, value)` rows, keeping missing readings as `None`.
pub fn read_raw_csv(path: &Path) -> Result<Vec<RawSample>, SourceError> {
    let file = File::open(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let reader = BufReader::new(file);
    let mut rows = Vec::new();
    let mut line_num = 0;

    for line_result in reader.lines() {
        line_num += 1;

        let line = match line_result {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!(line = line_num, error = %e, "Error reading CSV line");
                continue;
            }
        };

        // Skip header line
        if line_num == 1 && line.trim_start().starts_with("timestamp") {
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }

        match parse_csv_line(&line, line_num) {
            Ok(row) => rows.push(row),
            Err(e) => {
                tracing::warn!(line = line_num, error = %e, "Error parsing CSV line");
            }
        }
    }

    tracing::info!(count = rows.len(), path = %path.display(), "Loaded readings from CSV");
    Ok(rows)
}

/// Load a CSV file as a validated timeseries.
///
/// Missing readings are dropped and rows are sorted by timestamp; a reading
/// that repeats an earlier timestamp is discarded.
pub fn read_csv_timeseries(path: &Path) -> Result<Timeseries, SourceError> {
    let mut rows = read_raw_csv(path)?;
    rows.sort_by_key(|r| r.timestamp);

    let mut samples: Vec<Sample> = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(value) = row.value else { continue };
        if samples.last().is_some_and(|prev| prev.timestamp == row.timestamp) {
            tracing::warn!(timestamp = %row.timestamp, "Duplicate timestamp, keeping first reading");
            continue;
        }
        samples.push(Sample::new(row.timestamp, value));
    }

    if samples.is_empty() {
        return Err(SourceError::Empty(path.to_path_buf()));
    }
    Ok(Timeseries::new(samples)?)
}

/// Load a CSV file, naming it after the file stem.
pub fn read_csv_named(path: &Path) -> Result<NamedSeries, SourceError> {
    let name = path
        .file_stem()
        .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());
    Ok(NamedSeries::new(name, read_csv_timeseries(path)?))
}

fn parse_csv_line(line: &str, line_num: usize) -> Result<RawSample, String> {
    let fields: Vec<&str> = line.split(',').collect();

    if fields.len() < 2 {
        return Err(format!(
            "Expected at least 2 fields, got {} on line {}",
            fields.len(),
            line_num
        ));
    }

    let timestamp = parse_timestamp(fields[0])?;
    let value = parse_value(fields[1])?;
    Ok(RawSample { timestamp, value })
}

/// Parse RFC 3339 or epoch seconds.
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();

    if let Ok(epoch) = s.parse::<i64>() {
        return DateTime::<Utc>::from_timestamp(epoch, 0)
            .ok_or_else(|| format!("Epoch timestamp out of range: {epoch}"));
    }

    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            format!("{}Z", s.trim_end_matches('Z'))
                .parse::<DateTime<Utc>>()
                .map_err(|e| format!("Cannot parse timestamp '{}': {}", s, e))
        })
}

fn parse_value(s: &str) -> Result<Option<f64>, String> {
    let s = s.trim();
    if MISSING_MARKERS.iter().any(|m| s.eq_ignore_ascii_case(m)) {
        return Ok(None);
    }
    s.parse::<f64>()
        .map(|v| v.is_finite().then_some(v))
        .map_err(|_| format!("Cannot parse value as f64: '{}'", s))
}
