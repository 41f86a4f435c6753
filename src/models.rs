//! Data models for the climatology tool.
//!
//! This module contains the records, per-date summaries and query types
//! passed between ingest, aggregation, estimation and reporting.

use crate::calendar::CalendarTag;
use crate::error::ClimoError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which daily temperature series a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Variable {
    /// Daily maximum temperature.
    High,
    /// Daily minimum temperature.
    Low,
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::High => write!(f, "high"),
            Variable::Low => write!(f, "low"),
        }
    }
}

/// One day of observations from the record source.
///
/// The calendar date is kept as the source wrote it (`7/4` or `07/04`);
/// normalisation happens during aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Full observation date, when the source provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Month/day as written by the source.
    pub calendar_date: String,
    /// High temperature.
    pub high: f64,
    /// Low temperature.
    pub low: f64,
    /// Precipitation, if reported. Not used by any statistic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,
}

impl DailyRecord {
    /// Creates a record with only the fields the statistics need.
    pub fn new(calendar_date: impl Into<String>, high: f64, low: f64) -> Self {
        Self {
            date: None,
            calendar_date: calendar_date.into(),
            high,
            low,
            precipitation: None,
        }
    }
}

/// Lower and upper percentile thresholds, in whole percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileBounds {
    pub lower: f64,
    pub upper: f64,
}

impl Default for PercentileBounds {
    fn default() -> Self {
        Self {
            lower: 10.0,
            upper: 90.0,
        }
    }
}

impl PercentileBounds {
    /// Checks `0 <= lower <= upper <= 100`.
    pub fn validate(&self) -> Result<(), ClimoError> {
        for bound in [self.lower, self.upper] {
            if !(0.0..=100.0).contains(&bound) {
                return Err(ClimoError::InvalidPercentile(bound));
            }
        }
        if self.lower > self.upper {
            return Err(ClimoError::InvalidPercentile(self.lower));
        }
        Ok(())
    }
}

/// Summary of one temperature series within a calendar group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub median: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Value at the lower percentile bound.
    pub lower_pct: f64,
    /// Value at the upper percentile bound.
    pub upper_pct: f64,
    /// Record maximum.
    pub max: f64,
    /// Record minimum.
    pub min: f64,
}

/// Read-only summary of every observation sharing a calendar tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStatistics {
    pub tag: CalendarTag,
    /// Number of observations behind the summary.
    pub count: usize,
    pub high: SeriesStats,
    pub low: SeriesStats,
}

impl GroupStatistics {
    /// The summary for one variable.
    pub fn series(&self, variable: Variable) -> &SeriesStats {
        match variable {
            Variable::High => &self.high,
            Variable::Low => &self.low,
        }
    }
}

/// Raw observations sharing a calendar tag, in ingest order.
///
/// `highs[i]` and `lows[i]` come from the same record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalendarGroup {
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
}

impl CalendarGroup {
    pub fn push(&mut self, high: f64, low: f64) {
        self.highs.push(high);
        self.lows.push(low);
    }

    pub fn len(&self) -> usize {
        self.highs.len()
    }

    pub fn values(&self, variable: Variable) -> &[f64] {
        match variable {
            Variable::High => &self.highs,
            Variable::Low => &self.lows,
        }
    }
}

/// First and last year present in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodOfRecord {
    pub first_year: i32,
    pub last_year: i32,
}

impl fmt::Display for PeriodOfRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first_year, self.last_year)
    }
}

/// A question about the temperatures on one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityQuery {
    /// Calendar date as typed by the caller.
    pub tag: String,
    /// Target high temperature.
    pub high: f64,
    /// Target low temperature.
    pub low: f64,
}

/// Answer to a [`ProbabilityQuery`]. Probabilities are fractions in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityResult {
    pub tag: CalendarTag,
    pub query_high: f64,
    pub query_low: f64,
    /// P(high > query_high) under the fitted normal model.
    pub high_exceedance: f64,
    /// P(low <= query_low) under the fitted normal model.
    pub low_below: f64,
    /// Share of simulated days with high < query_high and low > query_low.
    /// `None` when the date has too few observations to simulate.
    pub joint_within_range: Option<f64>,
    /// Percentile rank of query_high among historical highs.
    pub high_percentile_rank: f64,
    /// Percentile rank of query_low among historical lows.
    pub low_percentile_rank: f64,
    /// Number of Monte Carlo draws behind `joint_within_range`.
    pub samples: usize,
    /// Variables whose marginal probability used the zero-variance rule.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degenerate: Vec<Variable>,
}

/// Daily mean temperature statistics for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStats {
    /// 1-based month number.
    pub month: u8,
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub lower_pct: f64,
    pub upper_pct: f64,
}
