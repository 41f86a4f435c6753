//! Numeric primitives shared by the aggregator and the estimator.
//!
//! Conventions:
//! - **Mean**: Neumaier-compensated summation.
//! - **Standard deviation**: population form (divisor `n`).
//! - **Covariance**: sample form (divisor `n − 1`).
//! - **Quantile / median**: linear interpolation between order statistics
//!   (Hyndman & Fan type 7), which is also what NumPy does by default.
//! - **Percentile rank**: "mean" kind, ties receive the average rank.
//!
//! All functions return `None` instead of panicking on empty input or
//! non-finite values.

/// 1/√(2π)
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Compensated sum of `data`.
pub fn kahan_sum(data: &[f64]) -> f64 {
    let mut sum = 0.0_f64;
    let mut c = 0.0_f64;
    for &x in data {
        let t = sum + x;
        if sum.abs() >= x.abs() {
            c += (sum - t) + x;
        } else {
            c += (x - t) + sum;
        }
        sum = t;
    }
    sum + c
}

fn all_finite(data: &[f64]) -> bool {
    data.iter().all(|x| x.is_finite())
}

/// Arithmetic mean.
///
/// Returns `None` if `data` is empty or contains NaN/Inf.
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() || !all_finite(data) {
        return None;
    }
    if data.iter().all(|&x| x == data[0]) {
        return Some(data[0]);
    }
    Some(kahan_sum(data) / data.len() as f64)
}

/// Population standard deviation (divisor `n`).
///
/// Exactly `0.0` when every value is equal, including the single-value case.
pub fn population_std_dev(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    if data.iter().all(|&x| x == data[0]) {
        return Some(0.0);
    }
    let squares: Vec<f64> = data.iter().map(|&x| (x - m) * (x - m)).collect();
    Some((kahan_sum(&squares) / data.len() as f64).sqrt())
}

/// Sample covariance of two equally long series (divisor `n − 1`).
///
/// Returns `None` if lengths differ, `n < 2`, or any value is non-finite.
pub fn sample_covariance(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n != y.len() || n < 2 {
        return None;
    }
    let mean_x = mean(x)?;
    let mean_y = mean(y)?;
    let products: Vec<f64> = x
        .iter()
        .zip(y)
        .map(|(&a, &b)| (a - mean_x) * (b - mean_y))
        .collect();
    Some(kahan_sum(&products) / (n as f64 - 1.0))
}

/// Returns a sorted copy, or `None` if `data` contains NaN.
pub fn sorted(data: &[f64]) -> Option<Vec<f64>> {
    if data.iter().any(|x| x.is_nan()) {
        return None;
    }
    let mut out = data.to_vec();
    out.sort_unstable_by(|a, b| a.total_cmp(b));
    Some(out)
}

/// `p`-th quantile (`p` in `[0, 1]`) of data already sorted ascending.
///
/// With `h = (n − 1)·p`, `j = ⌊h⌋`, `g = h − j`, the result is
/// `x[j] + g·(x[j+1] − x[j])`.
pub fn quantile_sorted(sorted_data: &[f64], p: f64) -> Option<f64> {
    let n = sorted_data.len();
    if n == 0 || !(0.0..=1.0).contains(&p) {
        return None;
    }
    if n == 1 {
        return Some(sorted_data[0]);
    }

    let h = (n - 1) as f64 * p;
    let j = h.floor() as usize;
    let g = h - h.floor();

    if j + 1 >= n {
        Some(sorted_data[n - 1])
    } else if g == 0.0 {
        Some(sorted_data[j])
    } else {
        let (a, b) = (sorted_data[j], sorted_data[j + 1]);
        // Clamped so rounding never steps outside the bracketing pair.
        Some((a + g * (b - a)).clamp(a, b))
    }
}

/// `pct`-th percentile (`pct` in `[0, 100]`) of unsorted data.
pub fn percentile(data: &[f64], pct: f64) -> Option<f64> {
    quantile_sorted(&sorted(data)?, pct / 100.0)
}

/// Percentile rank of `score` within `data`, "mean" kind.
///
/// `(count(x < score) + count(x <= score)) / 2`, as a percentage of `n`.
/// A score tied with `k` others gets the average of the ranks the tied
/// block would occupy.
pub fn percentile_of_score(data: &[f64], score: f64) -> Option<f64> {
    if data.is_empty() || score.is_nan() || data.iter().any(|x| x.is_nan()) {
        return None;
    }
    let strictly_below = data.iter().filter(|&&x| x < score).count();
    let at_or_below = data.iter().filter(|&&x| x <= score).count();
    Some((strictly_below + at_or_below) as f64 / 2.0 * 100.0 / data.len() as f64)
}

/// Standard normal CDF Φ(x).
///
/// Abramowitz & Stegun 26.2.17, absolute error below 7.5e-8.
pub fn standard_normal_cdf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x == f64::INFINITY {
        return 1.0;
    }
    if x == f64::NEG_INFINITY {
        return 0.0;
    }

    let abs_x = x.abs();
    let k = 1.0 / (1.0 + 0.231_641_9 * abs_x);
    let phi = FRAC_1_SQRT_2PI * (-0.5 * abs_x * abs_x).exp();
    let poly = k
        * (0.319_381_530
            + k * (-0.356_563_782 + k * (1.781_477_937 + k * (-1.821_255_978 + k * 1.330_274_429))));

    let upper = 1.0 - phi * poly;
    if x >= 0.0 {
        upper
    } else {
        1.0 - upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_basic() {
        assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), Some(3.0));
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, f64::NAN]), None);
        assert_eq!(mean(&[1.0, f64::INFINITY]), None);
    }

    #[test]
    fn test_population_std_dev() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_std_dev(&v).unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(population_std_dev(&[42.0]), Some(0.0));
        assert_eq!(population_std_dev(&[0.1; 7]), Some(0.0));
    }

    #[test]
    fn test_sample_covariance() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 6.0, 8.0, 10.0];
        assert!((sample_covariance(&x, &y).unwrap() - 5.0).abs() < 1e-12);
        assert_eq!(sample_covariance(&[1.0], &[2.0]), None);
        assert_eq!(sample_covariance(&[1.0, 2.0], &[2.0]), None);
    }

    #[test]
    fn test_median_interpolates_even_length() {
        assert_eq!(percentile(&[3.0, 1.0, 2.0], 50.0), Some(2.0));
        assert_eq!(percentile(&[4.0, 1.0, 3.0, 2.0], 50.0), Some(2.5));
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn test_percentile_linear() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&data, 0.0), Some(1.0));
        assert_eq!(percentile(&data, 100.0), Some(5.0));
        assert!((percentile(&data, 10.0).unwrap() - 1.4).abs() < 1e-12);
        assert!((percentile(&data, 90.0).unwrap() - 4.6).abs() < 1e-12);
        assert_eq!(percentile(&data, 101.0), None);
    }

    #[test]
    fn test_sorted_rejects_nan() {
        let v = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        assert_eq!(sorted(&v), Some(vec![1.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 9.0]));
        assert_eq!(sorted(&[1.0, f64::NAN]), None);
        assert_eq!(sorted(&[]), Some(Vec::new()));
    }

    #[test]
    fn test_percentile_of_score_ties() {
        let data = [1.0, 2.0, 3.0, 3.0, 4.0];
        // below: 2, at-or-below: 4 -> 3 / 5
        assert!((percentile_of_score(&data, 3.0).unwrap() - 60.0).abs() < 1e-12);
        assert_eq!(percentile_of_score(&data, 0.0), Some(0.0));
        assert_eq!(percentile_of_score(&data, 10.0), Some(100.0));
        assert_eq!(percentile_of_score(&[], 1.0), None);
    }

    #[test]
    fn test_standard_normal_cdf() {
        assert!((standard_normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((standard_normal_cdf(1.96) - 0.975).abs() < 1e-4);
        assert!((standard_normal_cdf(-1.96) - 0.025).abs() < 1e-4);
        assert_eq!(standard_normal_cdf(f64::INFINITY), 1.0);
        assert_eq!(standard_normal_cdf(f64::NEG_INFINITY), 0.0);
    }
}
