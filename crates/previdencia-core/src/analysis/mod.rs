//! Derived-series transformations and return aggregation.

pub mod adjust;
pub mod returns;
