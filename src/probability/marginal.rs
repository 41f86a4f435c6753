//! Single-variable probabilities under a normal model.
//!
//! A calendar date's highs (or lows) are modelled as
//! `Normal(mean, population std dev)`. When the standard deviation is zero
//! the CDF is undefined and the model refuses to build; callers fall back
//! to [`step_probability`].

use crate::calendar::CalendarTag;
use crate::error::ClimoError;
use crate::models::{SeriesStats, Variable};
use crate::stats;

/// Which side of a threshold is being asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tail {
    /// P(X > t)
    Above,
    /// P(X >= t)
    #[allow(dead_code)] // Queries ask for Above and AtOrBelow only
    AtOrAbove,
    /// P(X <= t)
    AtOrBelow,
    /// P(X < t)
    #[allow(dead_code)] // Queries ask for Above and AtOrBelow only
    Below,
}

/// Normal distribution with strictly positive spread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalModel {
    mean: f64,
    std_dev: f64,
}

impl NormalModel {
    pub fn new(mean: f64, std_dev: f64) -> Option<Self> {
        if mean.is_finite() && std_dev.is_finite() && std_dev > 0.0 {
            Some(Self { mean, std_dev })
        } else {
            None
        }
    }

    /// Fits the model to one series of a calendar group.
    pub fn fit(tag: CalendarTag, variable: Variable, series: &SeriesStats) -> Result<Self, ClimoError> {
        Self::new(series.mean, series.std_dev).ok_or_else(|| ClimoError::DegenerateDistribution {
            tag: tag.to_string(),
            variable,
        })
    }

    pub fn cdf(&self, x: f64) -> f64 {
        stats::standard_normal_cdf((x - self.mean) / self.std_dev)
    }

    /// Continuous, so strict and non-strict tails coincide.
    pub fn tail(&self, threshold: f64, tail: Tail) -> f64 {
        match tail {
            Tail::Above | Tail::AtOrAbove => 1.0 - self.cdf(threshold),
            Tail::AtOrBelow | Tail::Below => self.cdf(threshold),
        }
    }
}

/// Probability for a zero-variance series: all the mass sits on `mean`.
pub fn step_probability(mean: f64, threshold: f64, tail: Tail) -> f64 {
    let hit = match tail {
        Tail::Above => mean > threshold,
        Tail::AtOrAbove => mean >= threshold,
        Tail::AtOrBelow => mean <= threshold,
        Tail::Below => mean < threshold,
    };
    if hit {
        1.0
    } else {
        0.0
    }
}

/// Tail probability from the fitted normal model.
///
/// Returns [`ClimoError::DegenerateDistribution`] for a zero-variance
/// series; use [`resolve`] to apply the step rule instead.
pub fn probability(
    tag: CalendarTag,
    variable: Variable,
    series: &SeriesStats,
    threshold: f64,
    tail: Tail,
) -> Result<f64, ClimoError> {
    Ok(NormalModel::fit(tag, variable, series)?.tail(threshold, tail))
}

/// Like [`probability`], but resolves a degenerate series with
/// [`step_probability`]. The flag reports whether that happened.
pub fn resolve(
    tag: CalendarTag,
    variable: Variable,
    series: &SeriesStats,
    threshold: f64,
    tail: Tail,
) -> Result<(f64, bool), ClimoError> {
    match probability(tag, variable, series, threshold, tail) {
        Ok(p) => Ok((p, false)),
        Err(ClimoError::DegenerateDistribution { .. }) => {
            Ok((step_probability(series.mean, threshold, tail), true))
        }
        Err(e) => Err(e),
    }
}
