//! Seeded bivariate-normal sampling.
//!
//! Draws are `mean + L·z` where `L` is the lower Cholesky factor of the
//! covariance matrix and `z` a pair of independent standard normals.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Creates the generator for a simulation.
///
/// With a seed the sequence is reproducible on the same platform; without
/// one the generator is seeded from the operating system.
pub fn create_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    }
}

/// Two-dimensional normal distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BivariateNormal {
    mean: [f64; 2],
    /// Lower-triangular factor: `[[l11, 0], [l21, l22]]`.
    factor: [[f64; 2]; 2],
}

impl BivariateNormal {
    /// Builds the distribution from a mean vector and a covariance matrix.
    ///
    /// The matrix must be symmetric positive semi-definite, which any
    /// sample covariance is. A singular matrix is accepted: the missing
    /// direction simply collapses onto the mean. Returns `None` for
    /// non-finite input or negative variances.
    pub fn new(mean: [f64; 2], covariance: [[f64; 2]; 2]) -> Option<Self> {
        let [[c11, c12], [_, c22]] = covariance;
        let finite = mean.iter().chain(covariance.iter().flatten()).all(|v| v.is_finite());
        if !finite || c11 < 0.0 || c22 < 0.0 {
            return None;
        }

        let l11 = c11.sqrt();
        let l21 = if l11 > 0.0 { c12 / l11 } else { 0.0 };
        // Clamped: rounding can push a singular matrix slightly negative.
        let l22 = (c22 - l21 * l21).max(0.0).sqrt();

        Some(Self {
            mean,
            factor: [[l11, 0.0], [l21, l22]],
        })
    }

    pub fn mean(&self) -> [f64; 2] {
        self.mean
    }

    /// One draw.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> [f64; 2] {
        let z1: f64 = rng.sample(StandardNormal);
        let z2: f64 = rng.sample(StandardNormal);
        let [[l11, _], [l21, l22]] = self.factor;
        [self.mean[0] + l11 * z1, self.mean[1] + l21 * z1 + l22 * z2]
    }

    /// Fraction of `samples` draws satisfying `accept`.
    pub fn fraction_where<R, F>(&self, samples: usize, rng: &mut R, accept: F) -> f64
    where
        R: Rng,
        F: Fn([f64; 2]) -> bool,
    {
        if samples == 0 {
            return 0.0;
        }
        let hits = (0..samples).filter(|_| accept(self.sample(rng))).count();
        hits as f64 / samples as f64
    }
}
