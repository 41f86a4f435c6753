//! Error types for the climatology core.
//!
//! Aggregation and probability estimation report failures through
//! [`ClimoError`]. The CLI layer wraps these in `anyhow` with context.

use crate::models::Variable;
use thiserror::Error;

/// Errors raised by aggregation, ingest parsing and probability estimation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClimoError {
    /// The string is not a valid month/day pair.
    #[error("invalid calendar tag: '{0}'")]
    InvalidCalendarTag(String),

    /// The tag is valid but no observations exist for it.
    #[error("no observations for calendar tag {0}")]
    UnknownCalendarTag(String),

    /// A zero-variance group was used in a parametric calculation.
    #[error("degenerate {variable} distribution on {tag}: standard deviation is zero")]
    DegenerateDistribution { tag: String, variable: Variable },

    /// Covariance needs at least two observations.
    #[error("{tag} has {count} observation(s); at least 2 are needed for covariance")]
    InsufficientSamples { tag: String, count: usize },

    /// `aggregate` was handed no records.
    #[error("dataset contains no records")]
    EmptyDataset,

    /// Percentile bounds outside 0..=100 or inverted.
    #[error("invalid percentile bound: {0}")]
    InvalidPercentile(f64),

    /// Monte Carlo estimation with zero draws.
    #[error("sample count must be at least 1")]
    InvalidSampleCount,

    /// A line of input could not be turned into a record.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ClimoError::InvalidCalendarTag("02/30".to_string());
        assert_eq!(err.to_string(), "invalid calendar tag: '02/30'");

        let err = ClimoError::DegenerateDistribution {
            tag: "07/04".to_string(),
            variable: Variable::High,
        };
        assert!(err.to_string().contains("high"));
        assert!(err.to_string().contains("07/04"));

        let err = ClimoError::InsufficientSamples {
            tag: "02/29".to_string(),
            count: 1,
        };
        assert!(err.to_string().contains("at least 2"));
    }
}
