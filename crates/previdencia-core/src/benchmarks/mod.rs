//! External benchmark series: identities, session cache, and the
//! counterfactual unit-accounting simulator.

pub mod catalog;
pub mod simulator;

pub use catalog::{Benchmark, BenchmarkCache, BenchmarkProvider, BenchmarkSource};
