//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::smoothing::Statistic;
use crate::ingest::InputLayout;
use crate::models::Variable;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// climostats - calendar-date temperature climatology
///
/// Aggregates a station's daily highs and lows by calendar date and
/// answers probability questions about a given day.
///
/// Examples:
///   climostats --data dfw.csv stats
///   climostats --data dfw.csv stats --date 7/4
///   climostats stats --smooth --from-table dfw_stats.csv
///   climostats --data dfw.csv query --date 7/4 --high 99 --low 72 --seed 1
///   climostats --data dfw.csv interactive
///   climostats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Daily record file (CSV)
    ///
    /// Overrides `general.data_file` from the config file.
    #[arg(short, long, value_name = "FILE", global = true, env = "CLIMOSTATS_DATA")]
    pub data: Option<PathBuf>,

    /// Station name for report titles
    #[arg(long, value_name = "NAME", global = true)]
    pub station: Option<String>,

    /// The data file has no header line
    #[arg(long, global = true)]
    pub no_header: bool,

    /// Column layout of the data file
    #[arg(long, value_name = "LAYOUT", global = true)]
    pub layout: Option<InputLayout>,

    /// Lower percentile bound (0-100)
    #[arg(long, value_name = "PCT", global = true)]
    pub lower_pct: Option<f64>,

    /// Upper percentile bound (0-100)
    #[arg(long, value_name = "PCT", global = true)]
    pub upper_pct: Option<f64>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT", global = true)]
    pub format: Option<OutputFormat>,

    /// Write output to a file instead of stdout
    #[arg(short, long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .climostats.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .climostats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Per-date climatology report, one date's detail, or a seasonal series
    Stats(StatsArgs),
    /// Probabilities for one date and target high/low
    Query(QueryArgs),
    /// Prompt for queries until told to stop
    Interactive(InteractiveArgs),
    /// Daily-mean temperature statistics per calendar month
    Monthly,
}

#[derive(clap::Args, Debug, Clone)]
pub struct StatsArgs {
    /// Show only this calendar date (M/D or MM/DD), with histograms
    #[arg(long, value_name = "DATE")]
    pub date: Option<String>,

    /// Also write the annual stats table to this file
    #[arg(long, value_name = "FILE")]
    pub table: Option<PathBuf>,

    /// Build the seasonal series from a saved stats table instead of the
    /// data file
    #[arg(long, value_name = "FILE", requires = "smooth", conflicts_with_all = ["table", "date"])]
    pub from_table: Option<PathBuf>,

    /// Histogram bin width in degrees
    #[arg(long, value_name = "DEGREES")]
    pub histogram_interval: Option<f64>,

    /// Print a seasonal series with its polynomial fit instead of the report
    #[arg(long)]
    pub smooth: bool,

    /// Series to smooth
    #[arg(long, value_enum, default_value_t = Variable::High)]
    pub variable: Variable,

    /// Statistic to smooth
    #[arg(long, value_enum, default_value_t = Statistic::Mean)]
    pub statistic: Statistic,

    /// Degree of the smoothing polynomial
    #[arg(long, value_name = "DEGREE")]
    pub poly_degree: Option<usize>,

    /// Rows in the "most variable dates" tables
    #[arg(long, value_name = "COUNT")]
    pub top: Option<usize>,

    /// Keep 02/29 in seasonal series
    #[arg(long)]
    pub keep_leap_day: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct QueryArgs {
    /// Calendar date (M/D or MM/DD)
    #[arg(long, value_name = "DATE")]
    pub date: String,

    /// Target high temperature
    #[arg(long, allow_negative_numbers = true)]
    pub high: f64,

    /// Target low temperature
    #[arg(long, allow_negative_numbers = true)]
    pub low: f64,

    /// Monte Carlo draws for the joint probability
    #[arg(long, value_name = "COUNT")]
    pub samples: Option<usize>,

    /// Seed for reproducible draws
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct InteractiveArgs {
    /// Monte Carlo draws for the joint probability
    #[arg(long, value_name = "COUNT")]
    pub samples: Option<usize>,

    /// Seed for reproducible draws
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Output format for reports and answers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.command.is_none() {
            return Err(
                "A subcommand is required (stats, query, interactive, monthly)".to_string(),
            );
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        for pct in [self.lower_pct, self.upper_pct].into_iter().flatten() {
            if !(0.0..=100.0).contains(&pct) {
                return Err(format!("Percentile must be between 0 and 100, got {}", pct));
            }
        }
        if let (Some(lower), Some(upper)) = (self.lower_pct, self.upper_pct) {
            if lower > upper {
                return Err("--lower-pct must not exceed --upper-pct".to_string());
            }
        }

        match &self.command {
            Some(Command::Stats(stats)) => {
                if let Some(interval) = stats.histogram_interval {
                    if !interval.is_finite() || interval <= 0.0 {
                        return Err("Histogram interval must be positive".to_string());
                    }
                }
            }
            Some(Command::Query(QueryArgs { samples, .. }))
            | Some(Command::Interactive(InteractiveArgs { samples, .. })) => {
                if *samples == Some(0) {
                    return Err("Samples must be at least 1".to_string());
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["climostats"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_parse_query() {
        let args = parse(&["query", "--date", "7/4", "--high", "99", "--low", "-5", "--seed", "3"]);
        match &args.command {
            Some(Command::Query(query)) => {
                assert_eq!(query.date, "7/4");
                assert_eq!(query.high, 99.0);
                assert_eq!(query.low, -5.0);
                assert_eq!(query.seed, Some(3));
                assert_eq!(query.samples, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["stats", "--data", "dfw.csv", "-v", "--format", "json"]);
        assert_eq!(args.data, Some(PathBuf::from("dfw.csv")));
        assert!(args.verbose);
        assert_eq!(args.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_stats_defaults() {
        let args = parse(&["stats", "--smooth"]);
        match args.command {
            Some(Command::Stats(stats)) => {
                assert!(stats.smooth);
                assert_eq!(stats.variable, Variable::High);
                assert_eq!(stats.statistic, Statistic::Mean);
                assert_eq!(stats.date, None);
                assert_eq!(stats.from_table, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_from_table_needs_smooth() {
        let args = parse(&["stats", "--smooth", "--from-table", "dfw_stats.csv"]);
        match &args.command {
            Some(Command::Stats(stats)) => {
                assert_eq!(stats.from_table, Some(PathBuf::from("dfw_stats.csv")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(args.validate().is_ok());

        assert!(Args::try_parse_from(["climostats", "stats", "--from-table", "t.csv"]).is_err());
        assert!(Args::try_parse_from([
            "climostats", "stats", "--smooth", "--from-table", "t.csv", "--table", "out.csv"
        ])
        .is_err());
    }

    #[test]
    fn test_query_requires_targets() {
        assert!(Args::try_parse_from(["climostats", "query", "--date", "7/4"]).is_err());
    }

    #[test]
    fn test_validation_missing_subcommand() {
        assert!(parse(&[]).validate().is_err());
        assert!(parse(&["--init-config"]).validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let args = parse(&["monthly", "-v", "-q"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_percentiles() {
        assert!(parse(&["monthly", "--lower-pct", "120"]).validate().is_err());
        assert!(parse(&["monthly", "--lower-pct", "60", "--upper-pct", "40"])
            .validate()
            .is_err());
        assert!(parse(&["monthly", "--lower-pct", "5", "--upper-pct", "95"])
            .validate()
            .is_ok());
    }

    #[test]
    fn test_validation_samples_and_interval() {
        assert!(parse(&["interactive", "--samples", "0"]).validate().is_err());
        assert!(parse(&["stats", "--histogram-interval", "0"]).validate().is_err());
        assert!(parse(&["stats", "--histogram-interval", "2.5"]).validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = parse(&["monthly"]);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
