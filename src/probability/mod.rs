//! Probability estimation over aggregated climatology.
//!
//! - `marginal` - single-variable normal model and the zero-variance rule.
//! - `sampler` - seeded bivariate-normal draws.
//! - `estimator` - the per-query entry point.

pub mod estimator;
pub mod marginal;
pub mod sampler;

pub use estimator::{estimate_with_fallback, SimulationOptions};
