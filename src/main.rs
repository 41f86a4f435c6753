//! climostats - calendar-date temperature climatology
//!
//! Groups a station's daily highs and lows by month/day across every year
//! on record, summarises each date, and estimates how likely a given high
//! and low are on that date.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, unreadable data, unknown date, etc.)

mod analysis;
mod calendar;
mod cli;
mod config;
mod error;
mod ingest;
mod models;
mod probability;
mod report;
mod stats;

use analysis::smoothing::{histogram, seasonal_series, smooth_series};
use analysis::Climatology;
use anyhow::{Context, Result};
use calendar::{CalendarTag, TAG_COUNT};
use cli::{Args, Command, OutputFormat, QueryArgs, StatsArgs};
use config::{Config, DEFAULT_CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use ingest::{IngestConfig, RecordLoader};
use models::{DailyRecord, GroupStatistics, ProbabilityQuery, Variable};
use probability::SimulationOptions;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("climostats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .climostats.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("Edit it to set the station, data file, percentiles and simulation size.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args)?;

    let Some(command) = &args.command else {
        return Ok(());
    };

    let output = args.output.as_deref();

    match command {
        Command::Stats(stats_args) => match stats_args.from_table {
            // A saved table stands in for the data file.
            Some(ref table) => run_series_from_table(&config, stats_args, table, output),
            None => {
                let records = load_records(&config)?;
                let climatology = build_climatology(&records, &config, args.quiet)?;
                run_stats(&config, &climatology, stats_args, output)
            }
        },
        Command::Query(query_args) => {
            let records = load_records(&config)?;
            let climatology = build_climatology(&records, &config, args.quiet)?;
            run_query(&config, &climatology, query_args, output)
        }
        Command::Interactive(_) => {
            let records = load_records(&config)?;
            let climatology = build_climatology(&records, &config, args.quiet)?;
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            run_interactive(
                stdin.lock(),
                stdout.lock(),
                &climatology,
                &config.simulation_options(),
            )
        }
        Command::Monthly => run_monthly(&config, &load_records(&config)?, output),
    }
}

/// Load configuration from file or use defaults, apply the command line
/// on top, and validate the result.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = read_config(args)?;
    config.merge_with_args(args);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn read_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}

fn load_records(config: &Config) -> Result<Vec<DailyRecord>> {
    let loader = RecordLoader::new(IngestConfig::from(&config.general));
    loader.load(Path::new(&config.general.data_file))
}

/// Aggregate, with a progress bar over the calendar groups unless quiet.
fn build_climatology(records: &[DailyRecord], config: &Config, quiet: bool) -> Result<Climatology> {
    let climatology = if quiet {
        analysis::aggregate(records, config.percentiles())
    } else {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} dates",
                )
                .context("Invalid progress bar template")?
                .progress_chars("#>-"),
        );
        let result =
            analysis::aggregate_with_progress(records, config.percentiles(), |done, total| {
                pb.set_length(total as u64);
                pb.set_position(done as u64);
            });
        pb.finish_and_clear();
        result
    }
    .context("Failed to aggregate daily records")?;

    info!(
        "Summarised {} observations into {} of {} calendar dates",
        climatology.observation_count(),
        climatology.len(),
        TAG_COUNT
    );
    Ok(climatology)
}

/// Print to stdout, or write to `--output` when given.
fn emit(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            report::write_output(content, path)?;
            info!("Output saved to: {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn run_stats(
    config: &Config,
    climatology: &Climatology,
    args: &StatsArgs,
    output: Option<&Path>,
) -> Result<()> {
    let format = config.report.format;

    let content = if args.smooth {
        render_series(config, args, |tag| climatology.stats(tag))?
    } else if let Some(ref date) = args.date {
        let (stats, raws) = climatology.lookup(date)?;
        match format {
            OutputFormat::Markdown => {
                report::generate_date_detail(stats, raws, config.stats.histogram_interval)
            }
            OutputFormat::Json => {
                let interval = config.stats.histogram_interval;
                report::to_json(&serde_json::json!({
                    "stats": stats,
                    "histogram": {
                        "interval": interval,
                        "high": histogram(raws.values(Variable::High), interval),
                        "low": histogram(raws.values(Variable::Low), interval),
                    },
                }))?
            }
        }
    } else {
        let metadata = report::ReportMetadata::new(
            &config.general.station,
            &config.general.data_file,
            climatology,
        );
        match format {
            OutputFormat::Markdown => report::generate_markdown_report(
                climatology,
                &metadata,
                &report::ReportOptions {
                    top_dates: config.report.top_dates,
                },
            ),
            OutputFormat::Json => report::generate_json_report(climatology, &metadata)?,
        }
    };

    emit(&content, output)?;

    if let Some(ref table) = config.report.stats_table {
        report::write_stats_table(climatology.iter(), Path::new(table))?;
        info!("Stats table saved to: {}", table);
    }

    Ok(())
}

/// The seasonal series of one statistic and its polynomial fit.
fn render_series<'a, F>(config: &Config, args: &StatsArgs, lookup: F) -> Result<String>
where
    F: Fn(&CalendarTag) -> Option<&'a GroupStatistics>,
{
    let raw = seasonal_series(
        lookup,
        args.variable,
        args.statistic,
        config.stats.drop_leap_day,
    );
    let smoothed = smooth_series(&raw, config.stats.poly_degree);
    if smoothed.is_none() {
        warn!("Polynomial fit failed; showing the unsmoothed series");
    }

    match config.report.format {
        OutputFormat::Markdown => Ok(report::generate_series_markdown(
            args.variable,
            args.statistic,
            &raw,
            smoothed.as_deref(),
        )),
        OutputFormat::Json => report::to_json(&serde_json::json!({
            "variable": args.variable,
            "statistic": args.statistic,
            "poly_degree": config.stats.poly_degree,
            "series": raw,
            "smoothed": smoothed,
        })),
    }
}

/// `stats --smooth --from-table`: the series comes from a table written
/// by an earlier `stats --table` run, so the data file is never read.
fn run_series_from_table(
    config: &Config,
    args: &StatsArgs,
    table: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let stats_by_tag = report::read_stats_table(table, config.stats.drop_leap_day)?;
    if stats_by_tag.is_empty() {
        anyhow::bail!("Stats table {} has no rows", table.display());
    }
    info!(
        "Read {} of {} calendar dates from {}",
        stats_by_tag.len(),
        TAG_COUNT,
        table.display()
    );

    let content = render_series(config, args, |tag| stats_by_tag.get(tag))?;
    emit(&content, output)
}

fn run_query(
    config: &Config,
    climatology: &Climatology,
    args: &QueryArgs,
    output: Option<&Path>,
) -> Result<()> {
    let query = ProbabilityQuery {
        tag: args.date.clone(),
        high: args.high,
        low: args.low,
    };
    let options = config.simulation_options();
    let result = probability::estimate_with_fallback(&query, climatology, &options)
        .with_context(|| format!("Failed to estimate probabilities for {}", args.date))?;

    let content = match config.report.format {
        OutputFormat::Markdown => report::generate_probability_markdown(&result),
        OutputFormat::Json => report::to_json(&result)?,
    };
    emit(&content, output)
}

fn run_monthly(config: &Config, records: &[DailyRecord], output: Option<&Path>) -> Result<()> {
    let months = analysis::monthly_climatology(records, config.percentiles())
        .context("Failed to compute monthly climatology")?;

    let content = match config.report.format {
        OutputFormat::Markdown => report::generate_monthly_markdown(&months, config.percentiles()),
        OutputFormat::Json => report::to_json(&months)?,
    };
    emit(&content, output)
}

/// Reads one trimmed answer; `None` at end of input.
fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> Result<Option<String>> {
    write!(out, "{}", label)?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Prompts for a number until one parses.
fn prompt_number<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    label: &str,
) -> Result<Option<f64>> {
    loop {
        let Some(answer) = prompt(input, out, label)? else {
            return Ok(None);
        };
        match answer.parse::<f64>() {
            Ok(value) if value.is_finite() => return Ok(Some(value)),
            _ => writeln!(out, "'{}' is not a number, try again.", answer)?,
        }
    }
}

/// The interactive query loop.
///
/// Asks for a high, a low and a calendar date, prints the answer, and
/// repeats while the user answers `y` or `Y`. Bad dates and estimation
/// errors are reported and the loop carries on. A date seen only once
/// still gets its marginal answer.
fn run_interactive<R: BufRead, W: Write>(
    mut input: R,
    mut out: W,
    climatology: &Climatology,
    options: &SimulationOptions,
) -> Result<()> {
    loop {
        let Some(high) = prompt_number(&mut input, &mut out, "High temperature: ")? else {
            break;
        };
        let Some(low) = prompt_number(&mut input, &mut out, "Low temperature: ")? else {
            break;
        };
        let Some(tag) = prompt(&mut input, &mut out, "Date (M/D): ")? else {
            break;
        };

        let query = ProbabilityQuery { tag, high, low };
        match probability::estimate_with_fallback(&query, climatology, options) {
            Ok(result) => write!(out, "\n{}\n", report::format_probability_text(&result))?,
            Err(e) => {
                warn!("Query failed: {}", e);
                writeln!(out, "\n{}\n", e)?;
            }
        }

        match prompt(&mut input, &mut out, "Another query? (y/n): ")? {
            Some(answer) if answer == "y" || answer == "Y" => continue,
            _ => break,
        }
    }

    Ok(())
}
