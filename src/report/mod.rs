//! Report rendering and the annual stats table.

pub mod generator;

pub use generator::*;
