//! Calendar-date aggregation.
//!
//! Groups daily records by month/day across all years and computes the
//! per-date order statistics and moments used by reporting and by the
//! probability estimator.

use crate::calendar::CalendarTag;
use crate::error::ClimoError;
use crate::models::{
    CalendarGroup, DailyRecord, GroupStatistics, PercentileBounds, PeriodOfRecord, SeriesStats,
    Variable,
};
use crate::stats;
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Output of [`aggregate`]: per-date summaries plus the raw observations
/// they were computed from.
///
/// Both maps share the same key set and iterate in calendar order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Climatology {
    pub stats_by_tag: BTreeMap<CalendarTag, GroupStatistics>,
    pub raws_by_tag: BTreeMap<CalendarTag, CalendarGroup>,
    pub percentiles: PercentileBounds,
    /// Years covered, when the records carried full dates.
    pub period: Option<PeriodOfRecord>,
}

/// Groups `records` by calendar tag and summarises each group.
///
/// Fails on the first record whose calendar date is not a real month/day,
/// or whose temperatures are not finite. No record is ever skipped.
pub fn aggregate(
    records: &[DailyRecord],
    percentiles: PercentileBounds,
) -> Result<Climatology, ClimoError> {
    aggregate_with_progress(records, percentiles, |_, _| {})
}

/// [`aggregate`], calling `progress(done, total)` after each calendar
/// group is summarised.
pub fn aggregate_with_progress<F>(
    records: &[DailyRecord],
    percentiles: PercentileBounds,
    mut progress: F,
) -> Result<Climatology, ClimoError>
where
    F: FnMut(usize, usize),
{
    percentiles.validate()?;
    if records.is_empty() {
        return Err(ClimoError::EmptyDataset);
    }

    let mut raws_by_tag: BTreeMap<CalendarTag, CalendarGroup> = BTreeMap::new();
    let mut years: Option<(i32, i32)> = None;

    for (index, record) in records.iter().enumerate() {
        let tag = CalendarTag::parse(&record.calendar_date)?;
        if !record.high.is_finite() || !record.low.is_finite() {
            return Err(ClimoError::Parse {
                line: index + 1,
                message: format!("non-finite temperature on {}", tag),
            });
        }

        raws_by_tag
            .entry(tag)
            .or_default()
            .push(record.high, record.low);

        if let Some(date) = record.date {
            let year = date.year();
            years = Some(match years {
                Some((first, last)) => (first.min(year), last.max(year)),
                None => (year, year),
            });
        }
    }

    let mut stats_by_tag = BTreeMap::new();
    let total = raws_by_tag.len();
    for (tag, group) in &raws_by_tag {
        stats_by_tag.insert(*tag, summarize_group(*tag, group, percentiles)?);
        progress(stats_by_tag.len(), total);
    }

    debug!(
        "Aggregated {} records into {} calendar dates",
        records.len(),
        stats_by_tag.len()
    );

    Ok(Climatology {
        stats_by_tag,
        raws_by_tag,
        percentiles,
        period: years.map(|(first_year, last_year)| PeriodOfRecord {
            first_year,
            last_year,
        }),
    })
}

/// Computes the statistics of one group.
pub fn summarize_group(
    tag: CalendarTag,
    group: &CalendarGroup,
    percentiles: PercentileBounds,
) -> Result<GroupStatistics, ClimoError> {
    let describe_or_fail = |values: &[f64]| {
        describe(values, percentiles).ok_or_else(|| ClimoError::UnknownCalendarTag(tag.to_string()))
    };

    Ok(GroupStatistics {
        tag,
        count: group.len(),
        high: describe_or_fail(&group.highs)?,
        low: describe_or_fail(&group.lows)?,
    })
}

/// Summary of a single series; `None` when empty or non-finite.
pub fn describe(values: &[f64], percentiles: PercentileBounds) -> Option<SeriesStats> {
    let sorted = stats::sorted(values)?;
    Some(SeriesStats {
        median: stats::quantile_sorted(&sorted, 0.5)?,
        mean: stats::mean(values)?,
        std_dev: stats::population_std_dev(values)?,
        lower_pct: stats::quantile_sorted(&sorted, percentiles.lower / 100.0)?,
        upper_pct: stats::quantile_sorted(&sorted, percentiles.upper / 100.0)?,
        max: *sorted.last()?,
        min: *sorted.first()?,
    })
}

impl Climatology {
    /// Looks up both the summary and raw values for a tag.
    ///
    /// Accepts any spelling [`CalendarTag::parse`] does. Strings that are
    /// not real dates, or dates absent from the data, are both reported as
    /// [`ClimoError::UnknownCalendarTag`].
    pub fn lookup(&self, tag: &str) -> Result<(&GroupStatistics, &CalendarGroup), ClimoError> {
        let unknown = || ClimoError::UnknownCalendarTag(tag.trim().to_string());
        let parsed = CalendarTag::parse(tag).map_err(|_| unknown())?;
        let stats = self.stats_by_tag.get(&parsed).ok_or_else(unknown)?;
        let raws = self.raws_by_tag.get(&parsed).ok_or_else(unknown)?;
        Ok((stats, raws))
    }

    /// Summary for an already-parsed tag.
    pub fn stats(&self, tag: &CalendarTag) -> Option<&GroupStatistics> {
        self.stats_by_tag.get(tag)
    }

    /// Summaries in calendar order.
    pub fn iter(&self) -> impl Iterator<Item = &GroupStatistics> {
        self.stats_by_tag.values()
    }

    pub fn len(&self) -> usize {
        self.stats_by_tag.len()
    }

    /// Total number of observations across all groups.
    pub fn observation_count(&self) -> usize {
        self.raws_by_tag.values().map(CalendarGroup::len).sum()
    }

    /// Dates with the largest standard deviation for `variable`, most variable first.
    pub fn most_variable_dates(&self, variable: Variable, n: usize) -> Vec<&GroupStatistics> {
        let mut all: Vec<&GroupStatistics> = self.iter().collect();
        all.sort_by(|a, b| {
            b.series(variable)
                .std_dev
                .total_cmp(&a.series(variable).std_dev)
        });
        all.truncate(n);
        all
    }

    /// Highest record maximum and lowest record minimum, with their dates.
    pub fn record_extremes(&self) -> Option<((CalendarTag, f64), (CalendarTag, f64))> {
        let hottest = self
            .iter()
            .max_by(|a, b| a.high.max.total_cmp(&b.high.max))?;
        let coldest = self.iter().min_by(|a, b| a.low.min.total_cmp(&b.low.min))?;
        Some(((hottest.tag, hottest.high.max), (coldest.tag, coldest.low.min)))
    }
}
