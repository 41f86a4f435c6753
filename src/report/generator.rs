//! Report generation.
//!
//! Markdown and JSON renderings of a climatology, of probability answers
//! and of the monthly table, plus the annual stats table written as CSV
//! and read back as a cache of per-date statistics.

use crate::analysis::smoothing::{histogram, HistogramBin, Statistic};
use crate::analysis::Climatology;
use crate::calendar::{self, CalendarTag};
use crate::error::ClimoError;
use crate::models::{
    CalendarGroup, GroupStatistics, MonthlyStats, PercentileBounds, PeriodOfRecord,
    ProbabilityResult, SeriesStats, Variable,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Column names of the annual stats table.
pub const STATS_TABLE_HEADER: [&str; 15] = [
    "calendar_date",
    "high_median",
    "high_mean",
    "high_stdev",
    "high_lower_pct",
    "high_upper_pct",
    "high_max",
    "high_min",
    "low_median",
    "low_mean",
    "low_stdev",
    "low_lower_pct",
    "low_upper_pct",
    "low_max",
    "low_min",
];

/// Describes where a climatology came from.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub station: String,
    pub data_file: String,
    pub generated: DateTime<Utc>,
    pub period: Option<PeriodOfRecord>,
    pub observations: usize,
    pub dates: usize,
    pub percentiles: PercentileBounds,
}

impl ReportMetadata {
    pub fn new(station: &str, data_file: &str, climatology: &Climatology) -> Self {
        Self {
            station: station.to_string(),
            data_file: data_file.to_string(),
            generated: Utc::now(),
            period: climatology.period,
            observations: climatology.observation_count(),
            dates: climatology.len(),
            percentiles: climatology.percentiles,
        }
    }
}

/// Knobs for the Markdown climatology report.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Rows in the "most variable dates" tables.
    pub top_dates: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { top_dates: 10 }
    }
}

/// Generate the full Markdown climatology report.
pub fn generate_markdown_report(
    climatology: &Climatology,
    metadata: &ReportMetadata,
    options: &ReportOptions,
) -> String {
    let mut output = String::new();

    output.push_str(&generate_title(metadata));
    output.push_str(&generate_metadata_section(metadata));
    output.push_str(&generate_summary_section(climatology, options.top_dates));
    output.push_str(&generate_daily_table(climatology));
    output.push_str(&generate_footer());

    output
}

fn generate_title(metadata: &ReportMetadata) -> String {
    match metadata.period {
        Some(period) => format!("# {} Daily Temperatures ({})\n\n", metadata.station, period),
        None => format!("# {} Daily Temperatures\n\n", metadata.station),
    }
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Station:** {}\n", metadata.station));
    section.push_str(&format!("- **Data File:** `{}`\n", metadata.data_file));
    if let Some(period) = metadata.period {
        section.push_str(&format!("- **Period of Record:** {}\n", period));
    }
    section.push_str(&format!("- **Observations:** {}\n", metadata.observations));
    section.push_str(&format!("- **Calendar Dates:** {}\n", metadata.dates));
    section.push_str(&format!(
        "- **Percentile Bounds:** {} / {}\n",
        metadata.percentiles.lower, metadata.percentiles.upper
    ));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push('\n');

    section
}

fn generate_summary_section(climatology: &Climatology, top_dates: usize) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");

    if let Some(((hot_tag, hot), (cold_tag, cold))) = climatology.record_extremes() {
        section.push_str("| Record | Value | Date |\n");
        section.push_str("|:---|:---:|:---:|\n");
        section.push_str(&format!("| Highest high | {:.1} | {} |\n", hot, hot_tag));
        section.push_str(&format!("| Lowest low | {:.1} | {} |\n\n", cold, cold_tag));
    }

    for variable in [Variable::High, Variable::Low] {
        let dates = climatology.most_variable_dates(variable, top_dates);
        if dates.is_empty() {
            continue;
        }

        section.push_str(&format!("### Most Variable Dates ({})\n\n", variable));
        section.push_str("| Date | Std Dev | Mean | Observations |\n");
        section.push_str("|:---|:---:|:---:|:---:|\n");
        for stats in dates {
            let series = stats.series(variable);
            section.push_str(&format!(
                "| {} | {:.2} | {:.1} | {} |\n",
                stats.tag, series.std_dev, series.mean, stats.count
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_daily_table(climatology: &Climatology) -> String {
    let mut section = String::new();

    section.push_str("## Daily Statistics\n\n");
    section.push_str(
        "| Date | n | High Median | High Mean | High SD | High Lo | High Hi | High Max | High Min \
         | Low Median | Low Mean | Low SD | Low Lo | Low Hi | Low Max | Low Min |\n",
    );
    section.push_str(&format!("|:---|{}\n", ":---:|".repeat(15)));

    for stats in climatology.iter() {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            stats.tag,
            stats.count,
            series_cells(&stats.high),
            series_cells(&stats.low)
        ));
    }
    section.push('\n');

    section
}

fn series_cells(s: &SeriesStats) -> String {
    format!(
        "{:.1} | {:.1} | {:.2} | {:.1} | {:.1} | {:.1} | {:.1}",
        s.median, s.mean, s.std_dev, s.lower_pct, s.upper_pct, s.max, s.min
    )
}

fn generate_footer() -> String {
    "---\n\n*Report generated by climostats*\n".to_string()
}

/// Detail for one calendar date: both series and their histograms.
pub fn generate_date_detail(
    stats: &GroupStatistics,
    raws: &CalendarGroup,
    histogram_interval: f64,
) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "## {} {} ({} observations)\n\n",
        calendar::month_name(stats.tag.month()),
        stats.tag.day(),
        stats.count
    ));

    section.push_str("| Statistic | High | Low |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for statistic in [
        Statistic::Median,
        Statistic::Mean,
        Statistic::StdDev,
        Statistic::LowerPct,
        Statistic::UpperPct,
        Statistic::Max,
        Statistic::Min,
    ] {
        section.push_str(&format!(
            "| {} | {:.2} | {:.2} |\n",
            statistic_label(statistic),
            statistic.of(&stats.high),
            statistic.of(&stats.low)
        ));
    }
    section.push('\n');

    for variable in [Variable::High, Variable::Low] {
        let bins = histogram(raws.values(variable), histogram_interval);
        section.push_str(&generate_histogram(variable, &bins));
    }

    section
}

fn statistic_label(statistic: Statistic) -> &'static str {
    match statistic {
        Statistic::Median => "Median",
        Statistic::Mean => "Mean",
        Statistic::StdDev => "Std Dev",
        Statistic::LowerPct => "Lower Percentile",
        Statistic::UpperPct => "Upper Percentile",
        Statistic::Max => "Max",
        Statistic::Min => "Min",
    }
}

fn generate_histogram(variable: Variable, bins: &[HistogramBin]) -> String {
    if bins.is_empty() {
        return String::new();
    }

    let mut section = format!("### {} histogram\n\n```\n", variable);
    for bin in bins {
        section.push_str(&format!(
            "[{:>5.0}, {:>5.0})  {:>3}  {}\n",
            bin.lower,
            bin.upper,
            bin.count,
            "#".repeat(bin.count)
        ));
    }
    section.push_str("```\n\n");

    section
}

/// A seasonal series next to its smoothed counterpart.
pub fn generate_series_markdown(
    variable: Variable,
    statistic: Statistic,
    raw: &[(CalendarTag, f64)],
    smoothed: Option<&[(CalendarTag, f64)]>,
) -> String {
    let mut section = format!("## {} {}\n\n", variable, statistic_label(statistic));

    match smoothed {
        Some(smoothed) => {
            section.push_str("| Date | Value | Smoothed |\n");
            section.push_str("|:---|:---:|:---:|\n");
            for ((tag, value), (_, fit)) in raw.iter().zip(smoothed) {
                section.push_str(&format!("| {} | {:.2} | {:.2} |\n", tag, value, fit));
            }
        }
        None => {
            section.push_str("| Date | Value |\n");
            section.push_str("|:---|:---:|\n");
            for (tag, value) in raw {
                section.push_str(&format!("| {} | {:.2} |\n", tag, value));
            }
        }
    }
    section.push('\n');

    section
}

/// `0.016947` becomes `1.7%`.
pub fn format_percent(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

/// The joint probability, or a note when the date could not be simulated.
fn format_joint(joint_within_range: Option<f64>) -> String {
    match joint_within_range {
        Some(p) => format_percent(p),
        None => "unavailable (fewer than two observations)".to_string(),
    }
}

/// Plain-text answer for the interactive prompt.
pub fn format_probability_text(result: &ProbabilityResult) -> String {
    let mut text = String::new();

    text.push_str(&format!(
        "Chance the high exceeds {} on {}: {}\n",
        result.query_high,
        result.tag,
        format_percent(result.high_exceedance)
    ));
    text.push_str(&format!(
        "Chance the low is at or below {}: {}\n",
        result.query_low,
        format_percent(result.low_below)
    ));
    text.push_str(&format!(
        "Chance the high stays below {} and the low stays above {}: {}\n",
        result.query_high,
        result.query_low,
        format_joint(result.joint_within_range)
    ));
    text.push_str(&format!(
        "A high of {} is at the {:.1} percentile\n",
        result.query_high, result.high_percentile_rank
    ));
    text.push_str(&format!(
        "A low of {} is at the {:.1} percentile\n",
        result.query_low, result.low_percentile_rank
    ));
    if !result.degenerate.is_empty() {
        let names: Vec<String> = result.degenerate.iter().map(|v| v.to_string()).collect();
        text.push_str(&format!(
            "Note: every historical {} on this date is identical\n",
            names.join(" and ")
        ));
    }

    text
}

/// Markdown answer for a probability query.
pub fn generate_probability_markdown(result: &ProbabilityResult) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "## {} {}: high {}, low {}\n\n",
        calendar::month_name(result.tag.month()),
        result.tag.day(),
        result.query_high,
        result.query_low
    ));
    section.push_str("| Quantity | Value |\n");
    section.push_str("|:---|:---:|\n");
    section.push_str(&format!(
        "| P(high > {}) | {} |\n",
        result.query_high,
        format_percent(result.high_exceedance)
    ));
    section.push_str(&format!(
        "| P(low <= {}) | {} |\n",
        result.query_low,
        format_percent(result.low_below)
    ));
    section.push_str(&format!(
        "| P(high < {} and low > {}) | {} |\n",
        result.query_high,
        result.query_low,
        format_joint(result.joint_within_range)
    ));
    section.push_str(&format!(
        "| Percentile rank of high | {:.1} |\n",
        result.high_percentile_rank
    ));
    section.push_str(&format!(
        "| Percentile rank of low | {:.1} |\n",
        result.low_percentile_rank
    ));
    if result.joint_within_range.is_some() {
        section.push_str(&format!("\n*Joint probability from {} simulated days.*\n", result.samples));
    } else {
        section.push_str("\n*Joint probability needs at least two observations of this date.*\n");
    }

    for variable in &result.degenerate {
        section.push_str(&format!(
            "\n> Every historical {} on this date is identical; its probability is 0% or 100%.\n",
            variable
        ));
    }

    section
}

/// Markdown table of the monthly climatology.
pub fn generate_monthly_markdown(months: &[MonthlyStats], percentiles: PercentileBounds) -> String {
    let mut section = String::new();

    section.push_str("## Monthly Daily-Mean Temperature\n\n");
    section.push_str(&format!(
        "| Month | Days | Mean | Std Dev | P{} | P{} |\n",
        percentiles.lower, percentiles.upper
    ));
    section.push_str("|:---|:---:|:---:|:---:|:---:|:---:|\n");
    for month in months {
        section.push_str(&format!(
            "| {} | {} | {:.1} | {:.2} | {:.1} | {:.1} |\n",
            calendar::month_name(month.month),
            month.count,
            month.mean,
            month.std_dev,
            month.lower_pct,
            month.upper_pct
        ));
    }
    section.push('\n');

    section
}

/// JSON shape of a climatology.
#[derive(Debug, Serialize)]
pub struct ClimatologyDocument<'a> {
    pub metadata: &'a ReportMetadata,
    pub dates: Vec<&'a GroupStatistics>,
}

/// Generate a JSON climatology report.
pub fn generate_json_report(climatology: &Climatology, metadata: &ReportMetadata) -> Result<String> {
    let document = ClimatologyDocument {
        metadata,
        dates: climatology.iter().collect(),
    };
    to_json(&document)
}

/// Pretty JSON for any serializable result.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

/// Write rendered output to a file.
pub fn write_output(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write output file: {}", path.display()))?;

    Ok(())
}

/// Render the annual stats table: a header line, then one row per date
/// in calendar order.
pub fn format_stats_table<'a>(stats: impl IntoIterator<Item = &'a GroupStatistics>) -> String {
    let mut table = STATS_TABLE_HEADER.join(",");
    table.push('\n');

    for s in stats {
        let fields = [s.high, s.low].map(|series| {
            [
                series.median,
                series.mean,
                series.std_dev,
                series.lower_pct,
                series.upper_pct,
                series.max,
                series.min,
            ]
            .map(|v| v.to_string())
            .join(",")
        });
        table.push_str(&format!("{},{},{}\n", s.tag, fields[0], fields[1]));
    }

    table
}

/// Write the annual stats table to `path`.
pub fn write_stats_table<'a>(
    stats: impl IntoIterator<Item = &'a GroupStatistics>,
    path: &Path,
) -> Result<()> {
    write_output(&format_stats_table(stats), path)
}

/// Read an annual stats table back.
///
/// The table carries no observation counts, so `count` is 0 on every
/// entry read from disk.
pub fn read_stats_table(
    path: &Path,
    drop_leap_day: bool,
) -> Result<BTreeMap<CalendarTag, GroupStatistics>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read stats table: {}", path.display()))?;

    parse_stats_table(&content, drop_leap_day)
        .with_context(|| format!("Failed to parse stats table: {}", path.display()))
}

/// Parse the text of an annual stats table.
fn parse_stats_table(
    content: &str,
    drop_leap_day: bool,
) -> Result<BTreeMap<CalendarTag, GroupStatistics>, ClimoError> {
    let mut table = BTreeMap::new();

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with(STATS_TABLE_HEADER[0]) {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != STATS_TABLE_HEADER.len() {
            return Err(ClimoError::Parse {
                line: line_no,
                message: format!(
                    "expected {} columns, found {}",
                    STATS_TABLE_HEADER.len(),
                    fields.len()
                ),
            });
        }

        let tag = CalendarTag::parse(fields[0])?;
        if drop_leap_day && tag.is_leap_day() {
            continue;
        }

        let mut values = [0.0; 14];
        for (slot, (text, name)) in values
            .iter_mut()
            .zip(fields[1..].iter().zip(&STATS_TABLE_HEADER[1..]))
        {
            *slot = text.parse().map_err(|_| ClimoError::Parse {
                line: line_no,
                message: format!("invalid {} '{}'", name, text),
            })?;
        }

        let series = |v: &[f64]| SeriesStats {
            median: v[0],
            mean: v[1],
            std_dev: v[2],
            lower_pct: v[3],
            upper_pct: v[4],
            max: v[5],
            min: v[6],
        };

        table.insert(
            tag,
            GroupStatistics {
                tag,
                count: 0,
                high: series(&values[..7]),
                low: series(&values[7..]),
            },
        );
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate;
    use crate::models::DailyRecord;
    use chrono::NaiveDate;

    fn create_test_climatology() -> Climatology {
        let mut records = Vec::new();
        for (year, (h, l)) in (1990..).zip([(95.0, 75.0), (97.0, 76.0), (96.0, 74.0)]) {
            let mut record = DailyRecord::new("7/4", h, l);
            record.date = NaiveDate::from_ymd_opt(year, 7, 4);
            records.push(record);
        }
        records.push(DailyRecord::new("02/29", 60.0, 40.0));
        records.push(DailyRecord::new("1/1", 50.0, 30.0));
        records.push(DailyRecord::new("1/1", 54.0, 28.0));
        aggregate(&records, PercentileBounds::default()).unwrap()
    }

    fn create_test_result() -> ProbabilityResult {
        ProbabilityResult {
            tag: CalendarTag::parse("07/04").unwrap(),
            query_high: 99.0,
            query_low: 72.0,
            high_exceedance: 0.016947,
            low_below: 0.0234,
            joint_within_range: Some(0.9612),
            high_percentile_rank: 100.0,
            low_percentile_rank: 0.0,
            samples: 10_000,
            degenerate: Vec::new(),
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let climo = create_test_climatology();
        let metadata = ReportMetadata::new("DFW", "dfw.csv", &climo);
        let markdown = generate_markdown_report(&climo, &metadata, &ReportOptions::default());

        assert!(markdown.contains("# DFW Daily Temperatures (1990-1992)"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("## Daily Statistics"));
        assert!(markdown.contains("| Highest high | 97.0 | 07/04 |"));
        assert!(markdown.contains("| Lowest low | 28.0 | 01/01 |"));

        let daily = &markdown[markdown.find("## Daily Statistics").unwrap()..];
        assert!(daily.find("| 01/01 |").unwrap() < daily.find("| 02/29 |").unwrap());
        assert!(daily.find("| 02/29 |").unwrap() < daily.find("| 07/04 |").unwrap());
    }

    #[test]
    fn test_generate_metadata_section() {
        let climo = create_test_climatology();
        let metadata = ReportMetadata::new("DFW", "dfw.csv", &climo);
        let section = generate_metadata_section(&metadata);

        assert!(section.contains("dfw.csv"));
        assert!(section.contains("**Observations:** 6"));
        assert!(section.contains("**Calendar Dates:** 3"));
        assert!(section.contains("1990-1992"));
    }

    #[test]
    fn test_generate_date_detail() {
        let climo = create_test_climatology();
        let (stats, raws) = climo.lookup("07/04").unwrap();
        let detail = generate_date_detail(stats, raws, 5.0);

        assert!(detail.contains("## July 4 (3 observations)"));
        assert!(detail.contains("| Median | 96.00 | 75.00 |"));
        assert!(detail.contains("### high histogram"));
        assert!(detail.contains("### low histogram"));
    }

    #[test]
    fn test_probability_text_uses_one_decimal() {
        let text = format_probability_text(&create_test_result());

        assert!(text.contains("exceeds 99 on 07/04: 1.7%"));
        assert!(text.contains("at or below 72: 2.3%"));
        assert!(text.contains(": 96.1%"));
        assert!(text.contains("at the 100.0 percentile"));
        assert!(!text.contains("identical"));
    }

    #[test]
    fn test_probability_markdown_flags_degenerate() {
        let mut result = create_test_result();
        result.degenerate = vec![Variable::High];
        let markdown = generate_probability_markdown(&result);

        assert!(markdown.contains("## July 4: high 99, low 72"));
        assert!(markdown.contains("| P(high > 99) | 1.7% |"));
        assert!(markdown.contains("Every historical high"));
    }

    #[test]
    fn test_probability_without_joint() {
        let mut result = create_test_result();
        result.joint_within_range = None;
        result.samples = 0;

        let text = format_probability_text(&result);
        assert!(text.contains("exceeds 99 on 07/04: 1.7%"));
        assert!(text.contains("above 72: unavailable"));

        let markdown = generate_probability_markdown(&result);
        assert!(markdown.contains("| P(high < 99 and low > 72) | unavailable"));
        assert!(markdown.contains("needs at least two observations"));
        assert!(!markdown.contains("simulated days"));
    }

    #[test]
    fn test_generate_json_report() {
        let climo = create_test_climatology();
        let metadata = ReportMetadata::new("DFW", "dfw.csv", &climo);
        let json = generate_json_report(&climo, &metadata).unwrap();

        assert!(json.contains("\"station\""));
        assert!(json.contains("\"dates\""));
        assert!(json.contains("\"07/04\""));

        let result = to_json(&create_test_result()).unwrap();
        assert!(result.contains("\"high_exceedance\""));
        assert!(!result.contains("\"degenerate\""));
    }

    #[test]
    fn test_monthly_markdown() {
        let months = vec![MonthlyStats {
            month: 1,
            count: 2,
            mean: 40.5,
            std_dev: 0.5,
            lower_pct: 40.1,
            upper_pct: 40.9,
        }];
        let markdown = generate_monthly_markdown(&months, PercentileBounds::default());
        assert!(markdown.contains("| Month | Days | Mean | Std Dev | P10 | P90 |"));
        assert!(markdown.contains("| January | 2 | 40.5 | 0.50 | 40.1 | 40.9 |"));
    }

    #[test]
    fn test_series_markdown() {
        let tag = CalendarTag::parse("1/1").unwrap();
        let raw = vec![(tag, 52.0)];
        let smoothed = vec![(tag, 51.5)];

        let plain = generate_series_markdown(Variable::High, Statistic::Mean, &raw, None);
        assert!(plain.contains("| 01/01 | 52.00 |"));

        let both = generate_series_markdown(
            Variable::High,
            Statistic::Mean,
            &raw,
            Some(smoothed.as_slice()),
        );
        assert!(both.contains("| 01/01 | 52.00 | 51.50 |"));
    }

    #[test]
    fn test_stats_table_file_round_trip() {
        let climo = create_test_climatology();
        let file = tempfile::NamedTempFile::new().unwrap();
        write_stats_table(climo.iter(), file.path()).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].split(',').count(), 15);
        assert!(lines[1].starts_with("01/01,"));
        assert!(lines[2].starts_with("02/29,"));
        assert!(lines[3].starts_with("07/04,96,96,"));

        let table = read_stats_table(file.path(), false).unwrap();
        assert_eq!(table.len(), 3);
        for (tag, stats) in &table {
            let original = climo.stats(tag).unwrap();
            assert_eq!(stats.high, original.high);
            assert_eq!(stats.low, original.low);
        }

        let without_leap = read_stats_table(file.path(), true).unwrap();
        assert_eq!(without_leap.len(), 2);
        assert!(!without_leap.keys().any(|t| t.is_leap_day()));
    }

    #[test]
    fn test_parse_stats_table_errors() {
        let short = "07/04,1,2,3\n";
        assert!(matches!(
            parse_stats_table(short, false),
            Err(ClimoError::Parse { line: 1, .. })
        ));

        let bad_value = format!("{}\n07/04,x{}\n", STATS_TABLE_HEADER.join(","), ",1".repeat(13));
        assert!(matches!(
            parse_stats_table(&bad_value, false),
            Err(ClimoError::Parse { line: 2, .. })
        ));

        let bad_tag = format!("13/01{}\n", ",1".repeat(14));
        assert!(matches!(
            parse_stats_table(&bad_tag, false),
            Err(ClimoError::InvalidCalendarTag(_))
        ));
    }

    #[test]
    fn test_read_missing_stats_table() {
        let err = read_stats_table(Path::new("/nonexistent/table.csv"), false).unwrap_err();
        assert!(err.to_string().contains("Failed to read stats table"));
    }
}
