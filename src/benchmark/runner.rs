//! Benchmark execution engine
//!
//! Calls a benchmark with a growing iteration count until it has run long
//! enough to give a stable time per iteration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

use super::bencher::Bencher;
use crate::registry::BenchmarkCase;

/// Iteration growth is capped at this factor per round
const MAX_GROWTH: u128 = 100;

/// Benchmark configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Stop once a round has run at least this long
    pub min_time_ms: u64,
    /// Never run more iterations than this in one round
    pub max_iterations: u64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            min_time_ms: 1000,
            max_iterations: 1_000_000_000,
        }
    }
}

impl BenchmarkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set minimum measured time
    pub fn with_min_time(mut self, min_time: Duration) -> Self {
        self.min_time_ms = u64::try_from(min_time.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set iteration cap
    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn min_time(&self) -> Duration {
        Duration::from_millis(self.min_time_ms)
    }
}

/// Benchmark result
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub name: String,
    /// Iterations in the final, reported round
    pub iterations: u64,
    /// Measured time of the final round in nanoseconds
    pub elapsed_ns: u64,
    /// Number of rounds run before settling
    pub rounds: u32,
}

impl BenchmarkResult {
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_ns)
    }

    pub fn ns_per_iter(&self) -> f64 {
        if self.iterations == 0 {
            0.0
        } else {
            self.elapsed_ns as f64 / self.iterations as f64
        }
    }
}

impl fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<30} {:>12} {:>14.2} ns/op",
            self.name,
            self.iterations,
            self.ns_per_iter()
        )
    }
}

/// Runs benchmarks under a [`BenchmarkConfig`]
#[derive(Clone, Debug, Default)]
pub struct BenchmarkRunner {
    config: BenchmarkConfig,
}

impl BenchmarkRunner {
    pub fn new(config: BenchmarkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Run one benchmark to completion
    pub fn run(&self, case: &BenchmarkCase) -> BenchmarkResult {
        let min_time = self.config.min_time();
        let max_iterations = self.config.max_iterations.max(1);

        let mut n = 1;
        let mut rounds = 1;
        let mut elapsed = Self::run_round(case, n);

        while elapsed < min_time && n < max_iterations {
            n = next_iterations(n, elapsed, min_time, max_iterations);
            rounds += 1;
            elapsed = Self::run_round(case, n);
            debug!("{}: n={} took {:?}", case.name(), n, elapsed);
        }

        let result = BenchmarkResult {
            name: case.name().to_string(),
            iterations: n,
            elapsed_ns: u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
            rounds,
        };
        info!("{}", result);
        result
    }

    fn run_round(case: &BenchmarkCase, n: u64) -> Duration {
        let mut bencher = Bencher::new(n);
        case.work().run(&mut bencher);
        bencher.elapsed()
    }
}

/// Predict the iteration count that reaches `goal` given the last round.
///
/// Aims 20% past the prediction, grows at most 100x and at least by one, and
/// never exceeds `max`.
pub fn next_iterations(last: u64, elapsed: Duration, goal: Duration, max: u64) -> u64 {
    let last = last as u128;
    let elapsed_ns = elapsed.as_nanos().max(1);

    let mut n = goal.as_nanos() * last / elapsed_ns;
    n += n / 5;
    n = n.min(MAX_GROWTH * last);
    n = n.max(last + 1);
    n.min(max as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::new()
            .with_min_time(Duration::from_millis(50))
            .with_max_iterations(0);

        assert_eq!(config.min_time_ms, 50);
        assert_eq!(config.max_iterations, 1);
    }

    #[test]
    fn test_huge_min_time_saturates() {
        let config = BenchmarkConfig::new().with_min_time(Duration::MAX);
        assert_eq!(config.min_time_ms, u64::MAX);
    }

    #[test]
    fn test_next_iterations_growth_capped() {
        // 1 iteration in 1ns would predict a billion; growth cap wins
        let n = next_iterations(1, Duration::from_nanos(1), Duration::from_secs(1), 1_000_000_000);
        assert_eq!(n, 100);
    }

    #[test]
    fn test_next_iterations_prediction() {
        // 100 iterations in 10ms, goal 100ms -> 1000, plus 20%
        let n = next_iterations(
            100,
            Duration::from_millis(10),
            Duration::from_millis(100),
            1_000_000,
        );
        assert_eq!(n, 1200);
    }

    #[test]
    fn test_next_iterations_at_least_one_more() {
        let n = next_iterations(10, Duration::from_secs(5), Duration::from_millis(1), 1000);
        assert_eq!(n, 11);
    }

    #[test]
    fn test_next_iterations_respects_max() {
        let n = next_iterations(50, Duration::from_nanos(10), Duration::from_secs(1), 64);
        assert_eq!(n, 64);
    }

    #[test]
    fn test_run_stops_at_max_iterations() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let case = BenchmarkCase::new(
            "Noop",
            Arc::new(move |b: &mut Bencher| {
                counter.fetch_add(1, Ordering::SeqCst);
                b.iter(|| 1 + 1);
            }),
        );

        let runner = BenchmarkRunner::new(
            BenchmarkConfig::new()
                .with_min_time(Duration::from_secs(60))
                .with_max_iterations(500),
        );
        let result = runner.run(&case);

        assert_eq!(result.iterations, 500);
        assert_eq!(result.rounds as u64, calls.load(Ordering::SeqCst));
        assert!(result.ns_per_iter() >= 0.0);
    }

    #[test]
    fn test_result_display() {
        let result = BenchmarkResult {
            name: "BenchmarkAdd".to_string(),
            iterations: 1000,
            elapsed_ns: 2500,
            rounds: 3,
        };
        assert_eq!(result.ns_per_iter(), 2.5);
        assert!(result.to_string().contains("2.50 ns/op"));
    }
}
