//! Probability estimates for one calendar date.
//!
//! Marginal probabilities come from a normal model fitted with the
//! *population* standard deviation. The joint probability comes from a
//! bivariate normal whose covariance uses the *sample* divisor `n − 1`.
//! The two divisors differ on purpose and are kept that way; do not unify
//! them without checking every downstream consumer of the numbers.

use crate::analysis::Climatology;
use crate::calendar::CalendarTag;
use crate::error::ClimoError;
use crate::models::{CalendarGroup, GroupStatistics, ProbabilityQuery, ProbabilityResult, Variable};
use crate::probability::marginal::{self, Tail};
use crate::probability::sampler::{create_rng, BivariateNormal};
use crate::stats;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default number of Monte Carlo draws per query.
pub const DEFAULT_SAMPLES: usize = 10_000;

/// Monte Carlo settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationOptions {
    /// Number of bivariate draws.
    pub samples: usize,
    /// Fixed seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLES,
            seed: None,
        }
    }
}

/// The deterministic half of an estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct MarginalEstimate {
    pub tag: CalendarTag,
    pub query_high: f64,
    pub query_low: f64,
    /// P(high > query.high)
    pub high_exceedance: f64,
    /// P(low <= query.low)
    pub low_below: f64,
    pub high_percentile_rank: f64,
    pub low_percentile_rank: f64,
    /// Variables resolved with the zero-variance step rule.
    pub degenerate: Vec<Variable>,
}

/// Answers a query: marginal exceedance for the high, sub-threshold
/// probability for the low, Monte Carlo joint probability, and the
/// percentile rank of each queried value.
///
/// A draw counts toward the joint probability only when
/// `high < query.high` **and** `low > query.low`, both strict.
pub fn estimate(
    query: &ProbabilityQuery,
    climatology: &Climatology,
    options: &SimulationOptions,
) -> Result<ProbabilityResult, ClimoError> {
    if options.samples == 0 {
        return Err(ClimoError::InvalidSampleCount);
    }

    let (stats, raws) = climatology.lookup(&query.tag)?;
    // The joint model is the part that can refuse a date, so it goes first.
    let joint_within_range = joint_probability(query, stats, raws, options)?;
    let marginals = marginal_estimate(query, stats, raws)?;

    Ok(marginals.into_result(Some(joint_within_range), options.samples))
}

/// [`estimate`], answering the marginal half alone when the date has too
/// few observations for the joint model.
///
/// The fallback result has no joint probability and zero draws. Every
/// other error is passed through.
pub fn estimate_with_fallback(
    query: &ProbabilityQuery,
    climatology: &Climatology,
    options: &SimulationOptions,
) -> Result<ProbabilityResult, ClimoError> {
    match estimate(query, climatology, options) {
        Err(ClimoError::InsufficientSamples { tag, count }) => {
            warn!(
                "{}: {} observation(s), joint probability unavailable",
                tag, count
            );
            Ok(estimate_marginals(query, climatology)?.into_result(None, 0))
        }
        other => other,
    }
}

/// Marginal probabilities and percentile ranks only; needs no simulation
/// and works for single-observation dates.
pub fn estimate_marginals(
    query: &ProbabilityQuery,
    climatology: &Climatology,
) -> Result<MarginalEstimate, ClimoError> {
    let (stats, raws) = climatology.lookup(&query.tag)?;
    marginal_estimate(query, stats, raws)
}

impl MarginalEstimate {
    fn into_result(self, joint_within_range: Option<f64>, samples: usize) -> ProbabilityResult {
        ProbabilityResult {
            tag: self.tag,
            query_high: self.query_high,
            query_low: self.query_low,
            high_exceedance: self.high_exceedance,
            low_below: self.low_below,
            joint_within_range,
            high_percentile_rank: self.high_percentile_rank,
            low_percentile_rank: self.low_percentile_rank,
            samples,
            degenerate: self.degenerate,
        }
    }
}

fn marginal_estimate(
    query: &ProbabilityQuery,
    stats: &GroupStatistics,
    raws: &CalendarGroup,
) -> Result<MarginalEstimate, ClimoError> {
    let tag = stats.tag;
    let mut degenerate = Vec::new();

    let (high_exceedance, high_flat) =
        marginal::resolve(tag, Variable::High, &stats.high, query.high, Tail::Above)?;
    if high_flat {
        warn!("{}: every high is {}, using the step rule", tag, stats.high.mean);
        degenerate.push(Variable::High);
    }

    let (low_below, low_flat) =
        marginal::resolve(tag, Variable::Low, &stats.low, query.low, Tail::AtOrBelow)?;
    if low_flat {
        warn!("{}: every low is {}, using the step rule", tag, stats.low.mean);
        degenerate.push(Variable::Low);
    }

    let rank = |variable: Variable, score: f64| {
        stats::percentile_of_score(raws.values(variable), score)
            .ok_or_else(|| ClimoError::UnknownCalendarTag(tag.to_string()))
    };

    Ok(MarginalEstimate {
        tag,
        query_high: query.high,
        query_low: query.low,
        high_exceedance,
        low_below,
        high_percentile_rank: rank(Variable::High, query.high)?,
        low_percentile_rank: rank(Variable::Low, query.low)?,
        degenerate,
    })
}

/// Fits the bivariate model for a date.
///
/// Mean vector is the group means; covariance is the sample covariance of
/// the paired observations.
pub fn fit_joint_model(
    stats: &GroupStatistics,
    raws: &CalendarGroup,
) -> Result<BivariateNormal, ClimoError> {
    let insufficient = || ClimoError::InsufficientSamples {
        tag: stats.tag.to_string(),
        count: raws.len(),
    };
    if raws.len() < 2 {
        return Err(insufficient());
    }

    let c_hh = stats::sample_covariance(&raws.highs, &raws.highs).ok_or_else(insufficient)?;
    let c_hl = stats::sample_covariance(&raws.highs, &raws.lows).ok_or_else(insufficient)?;
    let c_ll = stats::sample_covariance(&raws.lows, &raws.lows).ok_or_else(insufficient)?;
    debug!(
        "{}: covariance [[{:.3}, {:.3}], [{:.3}, {:.3}]] from {} observations",
        stats.tag,
        c_hh,
        c_hl,
        c_hl,
        c_ll,
        raws.len()
    );

    BivariateNormal::new([stats.high.mean, stats.low.mean], [[c_hh, c_hl], [c_hl, c_ll]])
        .ok_or_else(insufficient)
}

fn joint_probability(
    query: &ProbabilityQuery,
    stats: &GroupStatistics,
    raws: &CalendarGroup,
    options: &SimulationOptions,
) -> Result<f64, ClimoError> {
    let model = fit_joint_model(stats, raws)?;
    let mut rng = create_rng(options.seed);
    let (high, low) = (query.high, query.low);

    let p = model.fraction_where(options.samples, &mut rng, |[h, l]| h < high && l > low);
    debug!(
        "{}: {} draws around {:?}, joint probability {:.4}",
        stats.tag,
        options.samples,
        model.mean(),
        p
    );
    Ok(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate;
    use crate::models::{DailyRecord, PercentileBounds};

    fn climatology(rows: &[(&str, f64, f64)]) -> Climatology {
        let records: Vec<DailyRecord> = rows
            .iter()
            .map(|&(tag, h, l)| DailyRecord::new(tag, h, l))
            .collect();
        aggregate(&records, PercentileBounds::default()).unwrap()
    }

    fn july_fourth() -> Climatology {
        climatology(&[
            ("07/04", 95.0, 75.0),
            ("07/04", 97.0, 76.0),
            ("07/04", 96.0, 74.0),
            ("07/04", 98.0, 77.0),
            ("07/04", 94.0, 73.0),
        ])
    }

    fn query(tag: &str, high: f64, low: f64) -> ProbabilityQuery {
        ProbabilityQuery {
            tag: tag.to_string(),
            high,
            low,
        }
    }

    fn seeded(samples: usize, seed: u64) -> SimulationOptions {
        SimulationOptions {
            samples,
            seed: Some(seed),
        }
    }

    #[test]
    fn test_july_fourth_exceedance() {
        let result = estimate(&query("7/4", 99.0, 75.0), &july_fourth(), &seeded(10_000, 1)).unwrap();

        assert_eq!(result.tag.to_string(), "07/04");
        assert!((result.high_exceedance - 0.016_947).abs() < 1e-4);
        assert!((result.low_below - 0.5).abs() < 1e-6);
        assert!(result.degenerate.is_empty());
        assert_eq!(result.samples, 10_000);
        let joint = result.joint_within_range.unwrap();
        assert!((0.0..=1.0).contains(&joint));
    }

    #[test]
    fn test_percentile_ranks() {
        let result = estimate(&query("07/04", 96.0, 80.0), &july_fourth(), &seeded(100, 1)).unwrap();
        assert_eq!(result.high_percentile_rank, 50.0);
        assert_eq!(result.low_percentile_rank, 100.0);

        let result = estimate(&query("07/04", 90.0, 74.0), &july_fourth(), &seeded(100, 1)).unwrap();
        assert_eq!(result.high_percentile_rank, 0.0);
        // one below, one tie -> (1 + 2) / 2 of 5
        assert_eq!(result.low_percentile_rank, 30.0);
    }

    #[test]
    fn test_same_seed_is_bit_identical() {
        let climo = july_fourth();
        let q = query("07/04", 97.0, 74.0);
        let a = estimate(&q, &climo, &seeded(5_000, 99)).unwrap();
        let b = estimate(&q, &climo, &seeded(5_000, 99)).unwrap();
        assert_eq!(
            a.joint_within_range.map(f64::to_bits),
            b.joint_within_range.map(f64::to_bits)
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_joint_converges_to_quadrant_probability() {
        // Zero sample covariance, so the quadrant probability factorises.
        let climo = climatology(&[
            ("01/15", 90.0, 71.0),
            ("01/15", 91.0, 69.0),
            ("01/15", 92.0, 69.0),
            ("01/15", 93.0, 71.0),
        ]);
        let (qh, ql) = (92.0, 69.0);
        let sd_high = (5.0_f64 / 3.0).sqrt();
        let sd_low = (4.0_f64 / 3.0).sqrt();
        let expected = stats::standard_normal_cdf((qh - 91.5) / sd_high)
            * (1.0 - stats::standard_normal_cdf((ql - 70.0) / sd_low));

        let result = estimate(&query("01/15", qh, ql), &climo, &seeded(200_000, 5)).unwrap();
        let joint = result.joint_within_range.unwrap();
        assert!(
            (joint - expected).abs() < 0.01,
            "got {}, expected {}",
            joint,
            expected
        );
    }

    #[test]
    fn test_monte_carlo_noise_shrinks_with_samples() {
        let climo = july_fourth();
        let q = query("07/04", 97.0, 74.0);
        let spread = |samples: usize| {
            let runs: Vec<f64> = (0..30)
                .map(|seed| {
                    estimate(&q, &climo, &seeded(samples, seed))
                        .unwrap()
                        .joint_within_range
                        .unwrap()
                })
                .collect();
            stats::population_std_dev(&runs).unwrap()
        };
        // 100x the draws should cut the noise roughly tenfold.
        assert!(spread(100) > 3.0 * spread(10_000));
    }

    #[test]
    fn test_joint_uses_strict_inequalities() {
        // Identical observations: every draw sits exactly on the means.
        let climo = climatology(&[("03/03", 60.0, 40.0), ("03/03", 60.0, 40.0)]);
        let on_edge = estimate(&query("03/03", 60.0, 40.0), &climo, &seeded(50, 1)).unwrap();
        assert_eq!(on_edge.joint_within_range, Some(0.0));

        let inside = estimate(&query("03/03", 61.0, 39.0), &climo, &seeded(50, 1)).unwrap();
        assert_eq!(inside.joint_within_range, Some(1.0));
    }

    #[test]
    fn test_degenerate_marginals_use_step_rule() {
        let climo = climatology(&[("03/03", 60.0, 40.0), ("03/03", 60.0, 40.0)]);
        let result = estimate(&query("03/03", 60.0, 40.0), &climo, &seeded(10, 1)).unwrap();
        assert_eq!(result.high_exceedance, 0.0);
        assert_eq!(result.low_below, 1.0);
        assert_eq!(result.degenerate, vec![Variable::High, Variable::Low]);
    }

    #[test]
    fn test_single_observation_date() {
        let climo = climatology(&[("02/29", 61.0, 40.0), ("03/01", 62.0, 41.0), ("03/01", 64.0, 43.0)]);
        let q = query("02/29", 61.0, 40.0);

        assert_eq!(
            estimate(&q, &climo, &SimulationOptions::default()).unwrap_err(),
            ClimoError::InsufficientSamples {
                tag: "02/29".to_string(),
                count: 1
            }
        );

        let marginals = estimate_marginals(&q, &climo).unwrap();
        assert_eq!(marginals.high_exceedance, 0.0);
        assert_eq!(marginals.low_below, 1.0);
        assert_eq!(marginals.high_percentile_rank, 50.0);
    }

    #[test]
    fn test_fallback_answers_single_observation_date() {
        let climo = climatology(&[("02/29", 61.0, 40.0), ("03/01", 62.0, 41.0), ("03/01", 64.0, 43.0)]);

        let result =
            estimate_with_fallback(&query("2/29", 60.0, 40.0), &climo, &seeded(1_000, 2)).unwrap();
        assert_eq!(result.tag.to_string(), "02/29");
        assert_eq!(result.joint_within_range, None);
        assert_eq!(result.samples, 0);
        assert_eq!(result.high_exceedance, 1.0);
        assert_eq!(result.low_below, 1.0);
        assert_eq!(result.degenerate, vec![Variable::High, Variable::Low]);

        // Dates with enough data get the full answer.
        let full =
            estimate_with_fallback(&query("03/01", 63.0, 42.0), &climo, &seeded(1_000, 2)).unwrap();
        assert!(full.joint_within_range.is_some());
        assert_eq!(full.samples, 1_000);

        // Other failures are not swallowed.
        assert_eq!(
            estimate_with_fallback(&query("12/25", 60.0, 40.0), &climo, &seeded(10, 2)).unwrap_err(),
            ClimoError::UnknownCalendarTag("12/25".to_string())
        );
    }

    #[test]
    fn test_unseeded_runs_agree_within_noise() {
        let climo = july_fourth();
        let q = query("07/04", 97.0, 74.0);
        let options = SimulationOptions {
            samples: 20_000,
            seed: None,
        };

        let a = estimate(&q, &climo, &options).unwrap();
        let b = estimate(&q, &climo, &options).unwrap();
        let (pa, pb) = (a.joint_within_range.unwrap(), b.joint_within_range.unwrap());
        assert!((0.0..=1.0).contains(&pa));
        assert!((0.0..=1.0).contains(&pb));
        // Standard error at 20k draws is below 0.004.
        assert!((pa - pb).abs() < 0.03, "{pa} vs {pb}");
        // The marginal half does not depend on the draws.
        assert_eq!(a.high_exceedance, b.high_exceedance);
        assert_eq!(a.high_percentile_rank, b.high_percentile_rank);
    }

    #[test]
    fn test_unknown_tag_and_bad_options() {
        let climo = july_fourth();
        assert_eq!(
            estimate(&query("02/30", 90.0, 70.0), &climo, &SimulationOptions::default()).unwrap_err(),
            ClimoError::UnknownCalendarTag("02/30".to_string())
        );
        assert_eq!(
            estimate(&query("07/05", 90.0, 70.0), &climo, &SimulationOptions::default()).unwrap_err(),
            ClimoError::UnknownCalendarTag("07/05".to_string())
        );
        assert_eq!(
            estimate(&query("07/04", 90.0, 70.0), &climo, &seeded(0, 1)).unwrap_err(),
            ClimoError::InvalidSampleCount
        );
    }
}
