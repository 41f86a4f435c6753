//! Optional post-processing over per-date statistics for charting:
//! seasonal series extraction, polynomial smoothing and histogram bins.

use crate::calendar::{canonical_tags, CalendarTag};
use crate::models::{GroupStatistics, SeriesStats, Variable};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Most bins a single histogram may have.
pub const MAX_HISTOGRAM_BINS: usize = 1_000;

/// A single column of [`SeriesStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Statistic {
    Median,
    Mean,
    StdDev,
    LowerPct,
    UpperPct,
    Max,
    Min,
}

impl Statistic {
    pub fn of(&self, series: &SeriesStats) -> f64 {
        match self {
            Statistic::Median => series.median,
            Statistic::Mean => series.mean,
            Statistic::StdDev => series.std_dev,
            Statistic::LowerPct => series.lower_pct,
            Statistic::UpperPct => series.upper_pct,
            Statistic::Max => series.max,
            Statistic::Min => series.min,
        }
    }
}

/// One histogram bin, `[lower, upper)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Pulls one statistic out of each date, walking the calendar from
/// `01/01` to `12/31` and skipping dates `lookup` has no summary for.
///
/// The leap day is skipped when `drop_leap_day` is set, since its sample
/// is a quarter the size of its neighbours.
pub fn seasonal_series<'a, F>(
    lookup: F,
    variable: Variable,
    statistic: Statistic,
    drop_leap_day: bool,
) -> Vec<(CalendarTag, f64)>
where
    F: Fn(&CalendarTag) -> Option<&'a GroupStatistics>,
{
    canonical_tags()
        .filter(|tag| !(drop_leap_day && tag.is_leap_day()))
        .filter_map(|tag| lookup(&tag))
        .map(|s| (s.tag, statistic.of(s.series(variable))))
        .collect()
}

/// Replaces each value with a least-squares polynomial fit over the day of
/// the year, so dates missing from the series leave gaps in the abscissa.
///
/// The degree is capped at `points.len() - 1`. Returns `None` for an empty
/// series or a singular system.
pub fn smooth_series(points: &[(CalendarTag, f64)], degree: usize) -> Option<Vec<(CalendarTag, f64)>> {
    let ys: Vec<f64> = points.iter().map(|&(_, y)| y).collect();
    let xs: Vec<f64> = points.iter().map(|(tag, _)| tag.day_index() as f64).collect();
    let coefficients = polyfit(&xs, &ys, degree)?;
    debug!(
        "Smoothed {} points with a degree {} polynomial",
        points.len(),
        coefficients.degree()
    );

    Some(
        points
            .iter()
            .zip(&xs)
            .map(|(&(tag, _), &x)| (tag, coefficients.evaluate(x)))
            .collect(),
    )
}

/// Fitted polynomial in a rescaled abscissa.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    /// Coefficients in ascending power order, for `t` in `[-1, 1]`.
    coefficients: Vec<f64>,
    x_min: f64,
    x_span: f64,
}

impl Polynomial {
    fn scale(&self, x: f64) -> f64 {
        if self.x_span == 0.0 {
            0.0
        } else {
            2.0 * (x - self.x_min) / self.x_span - 1.0
        }
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let t = self.scale(x);
        self.coefficients.iter().rev().fold(0.0, |acc, &c| acc * t + c)
    }
}

/// Least-squares polynomial fit via the normal equations.
///
/// The abscissa is mapped onto `[-1, 1]` first so a degree-5 fit over a
/// year of day indices stays well conditioned.
pub fn polyfit(xs: &[f64], ys: &[f64], degree: usize) -> Option<Polynomial> {
    if xs.is_empty() || xs.len() != ys.len() {
        return None;
    }
    let degree = degree.min(xs.len() - 1);
    let terms = degree + 1;

    let x_min = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let x_max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut poly = Polynomial {
        coefficients: Vec::new(),
        x_min,
        x_span: x_max - x_min,
    };

    // Augmented matrix [AᵀA | Aᵀy].
    let mut system = vec![vec![0.0; terms + 1]; terms];
    for (&x, &y) in xs.iter().zip(ys) {
        let t = poly.scale(x);
        let powers: Vec<f64> = (0..terms).map(|k| t.powi(k as i32)).collect();
        for row in 0..terms {
            for col in 0..terms {
                system[row][col] += powers[row] * powers[col];
            }
            system[row][terms] += powers[row] * y;
        }
    }

    poly.coefficients = solve(system)?;
    Some(poly)
}

/// Gaussian elimination with partial pivoting on an augmented matrix.
fn solve(mut m: Vec<Vec<f64>>) -> Option<Vec<f64>> {
    let n = m.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))?;
        if m[pivot][col].abs() < 1e-12 {
            return None;
        }
        m.swap(col, pivot);

        for row in col + 1..n {
            let factor = m[row][col] / m[col][col];
            for k in col..=n {
                m[row][k] -= factor * m[col][k];
            }
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| m[row][k] * solution[k]).sum();
        solution[row] = (m[row][n] - tail) / m[row][row];
    }
    Some(solution)
}

/// Bins `values` into fixed-width buckets aligned to multiples of `interval`.
///
/// Returns an empty vector for empty input, a non-positive interval, or an
/// interval so narrow the range would need more than
/// [`MAX_HISTOGRAM_BINS`] bins.
pub fn histogram(values: &[f64], interval: f64) -> Vec<HistogramBin> {
    if values.is_empty() || !interval.is_finite() || interval <= 0.0 || values.iter().any(|v| !v.is_finite()) {
        return Vec::new();
    }
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let first_edge = interval * (lo / interval).floor();
    let span = ((hi - first_edge) / interval).floor();
    if !span.is_finite() || span < 0.0 || span >= MAX_HISTOGRAM_BINS as f64 {
        warn!(
            "Histogram interval {} is too narrow for values {}..{}; skipping histogram",
            interval, lo, hi
        );
        return Vec::new();
    }
    let bins = span as usize + 1;

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: first_edge + i as f64 * interval,
            upper: first_edge + (i + 1) as f64 * interval,
            count: 0,
        })
        .collect();

    for &v in values {
        let index = (((v - first_edge) / interval).floor() as usize).min(bins - 1);
        out[index].count += 1;
    }
    out
}
