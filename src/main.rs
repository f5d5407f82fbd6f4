//! sensor-sigproc - sensor timeseries alignment and spectral/correlation analysis
//!
//! Reads `timestamp,value` CSV files and prints JSON results on stdout.
//!
//! # Usage
//!
//! ```bash
//! # Align several sensors onto their finest common interval
//! sensor-sigproc align outdoor_temp.csv indoor_temp.csv
//!
//! # Power spectral density after a 1/600 Hz low-pass
//! sensor-sigproc spectrum --psd --cutoff-hz 0.0016667 outdoor_temp.csv
//!
//! # Delay between two sensors
//! sensor-sigproc xcorr --max-lag 50 heater_power.csv indoor_temp.csv
//!
//! # Augmented Dickey-Fuller test
//! sensor-sigproc stationarity indoor_temp.csv
//! ```
//!
//! # Environment Variables
//!
//! - `SIGPROC_CONFIG`: Path to a TOML config file (default: ./sigproc.toml)
//! - `RUST_LOG`: Logging level (default: info)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use sensor_sigproc::config::{defaults, AnalysisConfig};
use sensor_sigproc::correlation::{AdfResult, CorrelationEngine, LagSpec};
use sensor_sigproc::processing::{
    fourier_spectrum, power_spectral_density, signal_to_noise, Spectrum,
};
use sensor_sigproc::sources::csv::read_csv_named;
use sensor_sigproc::sources::{NamedSeries, TimeseriesSource};
use sensor_sigproc::{Aligner, Resampler, UniformSignal};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "sensor-sigproc")]
#[command(about = "Align sensor timeseries and analyze their spectra and correlations")]
#[command(version)]
struct CliArgs {
    /// TOML config file (overrides SIGPROC_CONFIG and ./sigproc.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Align two or more CSV series onto their finest common interval
    Align {
        /// Input CSV files (`timestamp,value`)
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,
        /// Start the grid here instead of at the latest first reading (RFC 3339)
        #[arg(long)]
        earliest: Option<DateTime<Utc>>,
        /// Emit a chronological train/test split using `split.train_fraction`
        #[arg(long)]
        split: bool,
    },

    /// Amplitude spectrum or PSD of one resampled series
    Spectrum {
        file: PathBuf,
        /// Periodogram power spectral density instead of the amplitude spectrum
        #[arg(long)]
        psd: bool,
        /// Low-pass cutoff in Hz applied before the transform
        #[arg(long)]
        cutoff_hz: Option<f64>,
        /// Number of dominant peaks to report
        #[arg(long, default_value = "3")]
        peaks: usize,
    },

    /// Cross-correlate two series and report the peak lag
    Xcorr {
        a: PathBuf,
        b: PathBuf,
        /// Lag window in samples of the aligned grid
        #[arg(long, conflicts_with = "lag_percentage")]
        max_lag: Option<usize>,
        /// Lag window as a percentage of the aligned length, in [0, 100)
        #[arg(long)]
        lag_percentage: Option<f64>,
    },

    /// Augmented Dickey-Fuller unit-root test on one resampled series
    Stationarity { file: PathBuf },
}

// ============================================================================
// JSON Output
// ============================================================================

#[derive(Serialize)]
struct AlignedOutput {
    interval_secs: u64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    times: Vec<DateTime<Utc>>,
    /// In input order
    columns: Vec<ColumnOutput>,
}

#[derive(Serialize)]
struct ColumnOutput {
    name: String,
    values: Vec<f64>,
}

impl AlignedOutput {
    fn from_matrix(matrix: &sensor_sigproc::AlignedMatrix) -> Self {
        let columns = matrix
            .column_names()
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                Some(ColumnOutput {
                    name: name.clone(),
                    values: matrix.column_at(i)?.to_vec(),
                })
            })
            .collect();
        Self {
            interval_secs: matrix.interval().as_secs(),
            start: matrix.start(),
            end: matrix.end(),
            times: matrix.times(),
            columns,
        }
    }
}

#[derive(Serialize)]
struct SplitOutput {
    train: AlignedOutput,
    test: AlignedOutput,
}

#[derive(Serialize)]
struct SpectrumOutput {
    signal: String,
    interval_secs: u64,
    samples: usize,
    signal_to_noise: f64,
    /// Frequency below which most of the spectral mass lies; a starting
    /// point for `--cutoff-hz`
    suggested_cutoff_hz: Option<f64>,
    dominant_frequencies: Vec<(f64, f64)>,
    spectrum: Spectrum,
}

#[derive(Serialize)]
struct XcorrOutput {
    a: String,
    b: String,
    interval_secs: u64,
    peak_lag: i64,
    peak_lag_seconds: f64,
    peak_value: Option<f64>,
    lags: Vec<i64>,
    values: Vec<f64>,
}

#[derive(Serialize)]
struct StationarityOutput {
    signal: String,
    interval_secs: u64,
    stationary: bool,
    significance: f64,
    #[serde(flatten)]
    adf: AdfResult,
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    // Initialize logging on stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    let cfg = match &args.config {
        Some(path) => AnalysisConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::load(),
    };

    match args.command {
        SubCommand::Align {
            files,
            earliest,
            split,
        } => run_align(&cfg, &files, earliest, split),
        SubCommand::Spectrum {
            file,
            psd,
            cutoff_hz,
            peaks,
        } => run_spectrum(&cfg, &file, psd, cutoff_hz, peaks),
        SubCommand::Xcorr {
            a,
            b,
            max_lag,
            lag_percentage,
        } => run_xcorr(&cfg, &a, &b, max_lag, lag_percentage),
        SubCommand::Stationarity { file } => run_stationarity(&cfg, &file),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn load(path: &Path) -> Result<NamedSeries> {
    read_csv_named(path).with_context(|| format!("Failed to load {}", path.display()))
}

/// Resample with the configured gap policy, then low-pass when a cutoff is set.
fn prepare(
    cfg: &AnalysisConfig,
    series: &NamedSeries,
    cutoff_hz: Option<f64>,
) -> Result<UniformSignal> {
    let uniform = Resampler::resample_with(series.timeseries(), cfg.alignment.gap_fill)
        .with_context(|| format!("Failed to resample {}", series.name()))?;

    match cutoff_hz.or(cfg.filter.cutoff_hz) {
        Some(cutoff) => uniform
            .lowpass(cutoff, cfg.filter.order)
            .with_context(|| format!("Failed to low-pass {} at {cutoff} Hz", series.name())),
        None => Ok(uniform),
    }
}

fn run_align(
    cfg: &AnalysisConfig,
    files: &[PathBuf],
    earliest: Option<DateTime<Utc>>,
    split: bool,
) -> Result<()> {
    let series = files.iter().map(|p| load(p)).collect::<Result<Vec<_>>>()?;
    let sources: Vec<&dyn TimeseriesSource> =
        series.iter().map(|s| s as &dyn TimeseriesSource).collect();

    let matrix = Aligner::align_from(&sources, earliest).context("Alignment failed")?;
    info!(
        signals = matrix.width(),
        rows = matrix.len(),
        interval = %matrix.interval(),
        "Aligned signals"
    );

    if split {
        let (train, test) = matrix
            .split(cfg.split.train_fraction)
            .context("Train/test split failed")?;
        print_json(&SplitOutput {
            train: AlignedOutput::from_matrix(&train),
            test: AlignedOutput::from_matrix(&test),
        })
    } else {
        print_json(&AlignedOutput::from_matrix(&matrix))
    }
}

fn run_spectrum(
    cfg: &AnalysisConfig,
    file: &Path,
    psd: bool,
    cutoff_hz: Option<f64>,
    peaks: usize,
) -> Result<()> {
    let series = load(file)?;
    let signal = prepare(cfg, &series, cutoff_hz)?;

    let spectrum = if psd {
        power_spectral_density(signal.values(), signal.interval())
    } else {
        fourier_spectrum(signal.values(), signal.interval())
    }
    .context("Spectrum computation failed")?;

    info!(
        signal = series.name(),
        bins = spectrum.len(),
        peak_frequency = spectrum.peak_frequency,
        "Computed spectrum"
    );
    print_json(&SpectrumOutput {
        signal: series.name().to_string(),
        interval_secs: signal.interval().as_secs(),
        samples: signal.len(),
        signal_to_noise: signal_to_noise(signal.values(), true),
        suggested_cutoff_hz: spectrum.rolloff_frequency(defaults::CUTOFF_ROLLOFF_FRACTION),
        dominant_frequencies: spectrum.dominant_frequencies(peaks),
        spectrum,
    })
}

fn run_xcorr(
    cfg: &AnalysisConfig,
    a: &Path,
    b: &Path,
    max_lag: Option<usize>,
    lag_percentage: Option<f64>,
) -> Result<()> {
    let series_a = load(a)?;
    let series_b = load(b)?;

    let lag = match (max_lag, lag_percentage) {
        (Some(l), _) => LagSpec::Absolute(l),
        (None, Some(p)) => LagSpec::Percentage(p),
        (None, None) => cfg.lag_spec(),
    };

    let result = CorrelationEngine::cross_correlation(&series_a, &series_b, lag)
        .context("Cross-correlation failed")?;
    info!(
        a = series_a.name(),
        b = series_b.name(),
        peak_lag = result.peak_lag(),
        peak_lag_seconds = result.peak_lag_seconds(),
        "Estimated delay"
    );

    print_json(&XcorrOutput {
        a: series_a.name().to_string(),
        b: series_b.name().to_string(),
        interval_secs: result.interval.as_secs(),
        peak_lag: result.peak_lag(),
        peak_lag_seconds: result.peak_lag_seconds(),
        peak_value: result.peak().map(|(_, v)| v),
        lags: result.lags,
        values: result.values,
    })
}

fn run_stationarity(cfg: &AnalysisConfig, file: &Path) -> Result<()> {
    let series = load(file)?;
    let signal = prepare(cfg, &series, None)?;
    let significance = cfg.correlation.significance;

    let adf = CorrelationEngine::stationarity(signal.values()).context("ADF test failed")?;
    info!(
        signal = series.name(),
        statistic = adf.statistic,
        p_value = adf.p_value,
        used_lag = adf.used_lag,
        "Stationarity test"
    );

    print_json(&StationarityOutput {
        signal: series.name().to_string(),
        interval_secs: signal.interval().as_secs(),
        stationary: adf.is_stationary(significance),
        significance,
        adf,
    })
}
