//! Daily record loading.
//!
//! Reads comma-separated station history in one of two layouts:
//!
//! - **calendar**: `Date,Calendar date,High,Low,Precipitation`, where the
//!   second column is the month/day tag and the first a full `M/D/YYYY`
//!   date (may be blank).
//! - **dated**: `date,high,low[,precip]`, where the date is `M/D/YYYY` or
//!   `MMDDYYYY` and the calendar tag is derived from it.
//!
//! Every malformed line is an error; nothing is skipped except blank
//! lines, `#` comments and the optional header.

use crate::calendar::CalendarTag;
use crate::error::ClimoError;
use crate::models::DailyRecord;
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Column layout of the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputLayout {
    /// Decide per line: calendar when the second column is a month/day tag.
    #[default]
    Auto,
    /// Full date, calendar tag, high, low, precipitation.
    Calendar,
    /// Full date, high, low, optional precipitation.
    Dated,
}

/// Configuration for record loading.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Skip the first non-blank line.
    pub skip_header: bool,
    pub layout: InputLayout,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            skip_header: true,
            layout: InputLayout::Auto,
        }
    }
}

impl From<&crate::config::GeneralConfig> for IngestConfig {
    fn from(config: &crate::config::GeneralConfig) -> Self {
        Self {
            skip_header: config.skip_header,
            layout: config.layout,
        }
    }
}

/// Loads daily records from text.
pub struct RecordLoader {
    config: IngestConfig,
}

impl RecordLoader {
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    /// Read and parse a file.
    pub fn load(&self, path: &Path) -> Result<Vec<DailyRecord>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read data file: {}", path.display()))?;

        let records = self
            .parse_str(&content)
            .with_context(|| format!("Failed to parse data file: {}", path.display()))?;

        info!("Loaded {} daily records from {}", records.len(), path.display());
        Ok(records)
    }

    /// Parse file contents.
    pub fn parse_str(&self, content: &str) -> Result<Vec<DailyRecord>, ClimoError> {
        let mut records = Vec::new();
        let mut header_pending = self.config.skip_header;

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if header_pending {
                header_pending = false;
                debug!("Skipping header: {}", line);
                continue;
            }
            records.push(self.parse_line(index + 1, line)?);
        }

        Ok(records)
    }

    fn parse_line(&self, line_no: usize, line: &str) -> Result<DailyRecord, ClimoError> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();

        let layout = match self.config.layout {
            InputLayout::Auto if has_calendar_column(&fields) => InputLayout::Calendar,
            InputLayout::Auto => InputLayout::Dated,
            other => other,
        };

        match layout {
            InputLayout::Calendar => parse_calendar(line_no, &fields),
            _ => parse_dated(line_no, &fields),
        }
    }
}

/// A temperature never parses as a tag, so the second column decides.
fn has_calendar_column(fields: &[&str]) -> bool {
    fields
        .get(1)
        .is_some_and(|field| CalendarTag::parse(field).is_ok())
}

fn parse_error(line: usize, message: impl Into<String>) -> ClimoError {
    ClimoError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_calendar(line: usize, fields: &[&str]) -> Result<DailyRecord, ClimoError> {
    if fields.len() < 4 {
        return Err(parse_error(
            line,
            format!("expected at least 4 columns, found {}", fields.len()),
        ));
    }

    let date = match fields[0] {
        "" => None,
        text => Some(parse_date(line, text)?),
    };

    Ok(DailyRecord {
        date,
        precipitation: fields.get(4).and_then(|p| parse_precipitation(p)),
        ..DailyRecord::new(
            fields[1],
            parse_temperature(line, "high", fields[2])?,
            parse_temperature(line, "low", fields[3])?,
        )
    })
}

fn parse_dated(line: usize, fields: &[&str]) -> Result<DailyRecord, ClimoError> {
    if fields.len() < 3 {
        return Err(parse_error(
            line,
            format!("expected at least 3 columns, found {}", fields.len()),
        ));
    }

    let date = parse_date(line, fields[0])?;
    Ok(DailyRecord {
        date: Some(date),
        precipitation: fields.get(3).and_then(|p| parse_precipitation(p)),
        ..DailyRecord::new(
            format!("{}/{}", date.month(), date.day()),
            parse_temperature(line, "high", fields[1])?,
            parse_temperature(line, "low", fields[2])?,
        )
    })
}

/// `M/D/YYYY` or compact `MMDDYYYY`.
fn parse_date(line: usize, text: &str) -> Result<NaiveDate, ClimoError> {
    let format = if text.contains('/') { "%m/%d/%Y" } else { "%m%d%Y" };
    NaiveDate::parse_from_str(text, format)
        .map_err(|e| parse_error(line, format!("invalid date '{}': {}", text, e)))
}

fn parse_temperature(line: usize, column: &str, text: &str) -> Result<f64, ClimoError> {
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(parse_error(line, format!("invalid {} temperature '{}'", column, text))),
    }
}

/// Trace (`T`), missing (`M`) and blank values become `None`.
fn parse_precipitation(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|p| p.is_finite())
}
