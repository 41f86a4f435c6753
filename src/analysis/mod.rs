//! Analysis modules.
//!
//! Per-date aggregation is the core; monthly pooling and chart smoothing
//! are derived views over the same records and summaries.

pub mod aggregator;
pub mod monthly;
pub mod smoothing;

pub use aggregator::*;
pub use monthly::monthly_climatology;
