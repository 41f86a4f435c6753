//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.climostats.toml` files.

use crate::cli::{Args, Command, OutputFormat};
use crate::ingest::InputLayout;
use crate::models::PercentileBounds;
use crate::probability::estimator::{SimulationOptions, DEFAULT_SAMPLES};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = ".climostats.toml";

/// Highest smoothing polynomial degree accepted.
pub const MAX_POLY_DEGREE: usize = 10;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Station and input settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Aggregation and smoothing settings.
    #[serde(default)]
    pub stats: StatsConfig,

    /// Monte Carlo settings.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Station and input settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Station name used in report titles.
    #[serde(default = "default_station")]
    pub station: String,

    /// Daily record file.
    #[serde(default = "default_data_file")]
    pub data_file: String,

    /// Whether the first line of the data file is a header.
    #[serde(default = "default_true")]
    pub skip_header: bool,

    /// Column layout of the data file.
    #[serde(default)]
    pub layout: InputLayout,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            station: default_station(),
            data_file: default_data_file(),
            skip_header: true,
            layout: InputLayout::Auto,
        }
    }
}

fn default_station() -> String {
    "Station".to_string()
}

fn default_data_file() -> String {
    "weather.csv".to_string()
}

fn default_true() -> bool {
    true
}

/// Aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Lower percentile bound, in percent.
    #[serde(default = "default_lower_pct")]
    pub lower_pct: f64,

    /// Upper percentile bound, in percent.
    #[serde(default = "default_upper_pct")]
    pub upper_pct: f64,

    /// Histogram bin width in degrees.
    #[serde(default = "default_histogram_interval")]
    pub histogram_interval: f64,

    /// Degree of the smoothing polynomial.
    #[serde(default = "default_poly_degree")]
    pub poly_degree: usize,

    /// Leave 02/29 out of seasonal series and stats table reads.
    #[serde(default = "default_true")]
    pub drop_leap_day: bool,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            lower_pct: default_lower_pct(),
            upper_pct: default_upper_pct(),
            histogram_interval: default_histogram_interval(),
            poly_degree: default_poly_degree(),
            drop_leap_day: true,
        }
    }
}

fn default_lower_pct() -> f64 {
    10.0
}

fn default_upper_pct() -> f64 {
    90.0
}

fn default_histogram_interval() -> f64 {
    5.0
}

fn default_poly_degree() -> usize {
    5
}

/// Monte Carlo settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Draws per query.
    #[serde(default = "default_samples")]
    pub samples: usize,

    /// Fixed seed; unset means a fresh seed per run.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            samples: default_samples(),
            seed: None,
        }
    }
}

fn default_samples() -> usize {
    DEFAULT_SAMPLES
}

/// Report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Where `stats` also writes the annual stats table.
    #[serde(default)]
    pub stats_table: Option<String>,

    /// Output format for reports and answers.
    #[serde(default)]
    pub format: OutputFormat,

    /// Rows in the "most variable dates" tables.
    #[serde(default = "default_top_dates")]
    pub top_dates: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            stats_table: None,
            format: OutputFormat::Markdown,
            top_dates: default_top_dates(),
        }
    }
}

fn default_top_dates() -> usize {
    10
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given explicitly on the command line override the file.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref data) = args.data {
            self.general.data_file = data.display().to_string();
        }
        if let Some(ref station) = args.station {
            self.general.station = station.clone();
        }
        if args.no_header {
            self.general.skip_header = false;
        }
        if let Some(layout) = args.layout {
            self.general.layout = layout;
        }
        if let Some(lower) = args.lower_pct {
            self.stats.lower_pct = lower;
        }
        if let Some(upper) = args.upper_pct {
            self.stats.upper_pct = upper;
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }

        match &args.command {
            Some(Command::Stats(stats)) => {
                if let Some(ref table) = stats.table {
                    self.report.stats_table = Some(table.display().to_string());
                }
                if let Some(interval) = stats.histogram_interval {
                    self.stats.histogram_interval = interval;
                }
                if let Some(degree) = stats.poly_degree {
                    self.stats.poly_degree = degree;
                }
                if let Some(top) = stats.top {
                    self.report.top_dates = top;
                }
                if stats.keep_leap_day {
                    self.stats.drop_leap_day = false;
                }
            }
            Some(Command::Query(query)) => self.merge_simulation(query.samples, query.seed),
            Some(Command::Interactive(interactive)) => {
                self.merge_simulation(interactive.samples, interactive.seed)
            }
            Some(Command::Monthly) | None => {}
        }
    }

    fn merge_simulation(&mut self, samples: Option<usize>, seed: Option<u64>) {
        if let Some(samples) = samples {
            self.simulation.samples = samples;
        }
        if seed.is_some() {
            self.simulation.seed = seed;
        }
    }

    /// Check the merged settings before any data is read.
    pub fn validate(&self) -> Result<()> {
        if self.general.data_file.trim().is_empty() {
            bail!("[general] data_file must not be empty");
        }

        self.percentiles()
            .validate()
            .context("[stats] lower_pct and upper_pct must satisfy 0 <= lower <= upper <= 100")?;

        let interval = self.stats.histogram_interval;
        if !interval.is_finite() || interval <= 0.0 {
            bail!(
                "[stats] histogram_interval must be a positive number, got {}",
                interval
            );
        }

        if self.stats.poly_degree > MAX_POLY_DEGREE {
            bail!(
                "[stats] poly_degree must be at most {}, got {}",
                MAX_POLY_DEGREE,
                self.stats.poly_degree
            );
        }

        if self.simulation.samples == 0 {
            bail!("[simulation] samples must be at least 1");
        }

        Ok(())
    }

    pub fn percentiles(&self) -> PercentileBounds {
        PercentileBounds {
            lower: self.stats.lower_pct,
            upper: self.stats.upper_pct,
        }
    }

    pub fn simulation_options(&self) -> SimulationOptions {
        SimulationOptions {
            samples: self.simulation.samples,
            seed: self.simulation.seed,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
