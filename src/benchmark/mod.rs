//! Micro-benchmark support
//!
//! Provides the [`Bencher`] handle and the iteration-growth runner.

mod bencher;
mod runner;

pub use bencher::Bencher;
pub use runner::{next_iterations, BenchmarkConfig, BenchmarkResult, BenchmarkRunner};
