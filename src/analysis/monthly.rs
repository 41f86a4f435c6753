//! Monthly climatology of daily mean temperature.

use crate::calendar::CalendarTag;
use crate::error::ClimoError;
use crate::models::{DailyRecord, MonthlyStats, PercentileBounds};
use crate::stats;
use std::collections::BTreeMap;

/// Pools `(high + low) / 2` for every record by calendar month.
///
/// Months with no records are omitted. Spread is the population standard
/// deviation, matching the per-date statistics.
pub fn monthly_climatology(
    records: &[DailyRecord],
    percentiles: PercentileBounds,
) -> Result<Vec<MonthlyStats>, ClimoError> {
    percentiles.validate()?;
    if records.is_empty() {
        return Err(ClimoError::EmptyDataset);
    }

    let mut by_month: BTreeMap<u8, Vec<f64>> = BTreeMap::new();
    for record in records {
        let tag = CalendarTag::parse(&record.calendar_date)?;
        by_month
            .entry(tag.month())
            .or_default()
            .push((record.high + record.low) / 2.0);
    }

    by_month
        .into_iter()
        .map(|(month, means)| {
            let summary = || -> Option<MonthlyStats> {
                Some(MonthlyStats {
                    month,
                    count: means.len(),
                    mean: stats::mean(&means)?,
                    std_dev: stats::population_std_dev(&means)?,
                    lower_pct: stats::percentile(&means, percentiles.lower)?,
                    upper_pct: stats::percentile(&means, percentiles.upper)?,
                })
            };
            summary().ok_or_else(|| ClimoError::Parse {
                line: 0,
                message: format!("non-finite temperature in month {}", month),
            })
        })
        .collect()
}
