//! Case execution driver
//!
//! Runs registered cases in order, each on its own worker thread, and joins
//! top-level parallel cases once every top-level case has been started.

use futures::future::join_all;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info};

use super::context::{RunShared, TestContext};
use super::error::{panic_message, HarnessError};
use super::filter::CaseFilter;
use super::parallel::{ChildSignal, Gate, ParallelSlots};
use super::tree::{lock, CaseTree};
use crate::benchmark::{BenchmarkResult, BenchmarkRunner};
use crate::models::{CaseId, ExecutionReport};
use crate::registry::{Registry, Runnable};

/// Completion of a case worker thread
pub(crate) struct CaseJoin {
    path: String,
    done: oneshot::Receiver<()>,
}

impl CaseJoin {
    /// Resolves once the worker has finished the case, cleanups included
    pub async fn wait(self) -> Result<(), HarnessError> {
        self.done.await.map_err(|_| {
            HarnessError::Runtime(format!("worker for {} exited before finishing", self.path))
        })
    }
}

/// Start a case on its own worker thread.
///
/// A parked parallel case holds its thread until the parent's gate opens. The
/// returned receiver yields once: when the case calls `parallel()` or when it
/// finishes, whichever comes first.
pub(crate) fn spawn_case(
    shared: Arc<RunShared>,
    id: CaseId,
    path: String,
    depth: usize,
    work: Arc<dyn Runnable>,
    parent_gate: watch::Receiver<bool>,
) -> Result<(CaseJoin, oneshot::Receiver<ChildSignal>), HarnessError> {
    let (signal_tx, signal_rx) = oneshot::channel();
    let (done_tx, done_rx) = oneshot::channel();
    let join = CaseJoin {
        path: path.clone(),
        done: done_rx,
    };

    thread::Builder::new()
        .name(format!("case-{}", id.0))
        .spawn(move || {
            let ctx = TestContext::new(shared, id, path, depth, signal_tx, parent_gate);
            execute_case(ctx, work.as_ref());
            let _ = done_tx.send(());
        })
        .map_err(|e| {
            HarnessError::Runtime(format!("failed to start worker for {}: {}", join.path, e))
        })?;

    Ok((join, signal_rx))
}

fn execute_case(mut ctx: TestContext, work: &dyn Runnable) {
    debug!("=== RUN   {}", ctx.name());

    // Halts were already recorded by fatal()/skip()
    let result = panic::catch_unwind(AssertUnwindSafe(|| work.run(&mut ctx)));
    if let Err(payload) = result {
        ctx.record_panic("body", panic_message(payload.as_ref()));
    }

    ctx.finish();
}

/// Test case executor
pub struct Executor {
    max_parallel: usize,
    short_mode: bool,
    filter: CaseFilter,
}

impl Executor {
    pub fn new() -> Self {
        Self {
            max_parallel: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            short_mode: false,
            filter: CaseFilter::default(),
        }
    }

    /// Upper bound on concurrently running parallel cases
    pub fn max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    pub fn short_mode(mut self, short: bool) -> Self {
        self.short_mode = short;
        self
    }

    pub fn filter(mut self, filter: CaseFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Run every registered case matching the filter.
    ///
    /// Case failures end up in the report; only harness errors are returned as `Err`.
    pub async fn run(&self, registry: &Registry) -> Result<ExecutionReport, HarnessError> {
        info!(
            "Running {} cases (max {} parallel, short mode: {})",
            registry.len(),
            self.max_parallel,
            self.short_mode
        );

        let start = Instant::now();
        let shared = Arc::new(RunShared {
            tree: Mutex::new(CaseTree::new()),
            slots: ParallelSlots::new(self.max_parallel),
            runtime: Handle::current(),
            short_mode: self.short_mode,
            filter: self.filter.clone(),
        });

        let gate = Gate::new();
        let mut parallel = Vec::new();

        for case in registry.cases() {
            if !self.filter.matches(0, case.name()) {
                continue;
            }
            if shared.is_aborted() {
                break;
            }

            let (id, path) = {
                let mut tree = lock(&shared.tree);
                let id = tree
                    .add(None, case.name())
                    .map_err(|e| HarnessError::registration(None, e))?;
                (id, tree.path(id).to_string())
            };

            let spawned = spawn_case(
                Arc::clone(&shared),
                id,
                path,
                0,
                case.work(),
                gate.subscribe(),
            );
            let (join, signal) = match spawned {
                Ok(spawned) => spawned,
                Err(err) => {
                    shared.abort(err);
                    break;
                }
            };

            match signal.await {
                Ok(ChildSignal::Parallel) => parallel.push(join),
                Ok(ChildSignal::Finished(_)) | Err(_) => {
                    if let Err(err) = join.wait().await {
                        shared.abort(err);
                    }
                }
            }
        }

        gate.open();
        if !parallel.is_empty() {
            debug!("Waiting on {} parallel top-level cases", parallel.len());
            shared.slots.release();
            for result in join_all(parallel.into_iter().map(CaseJoin::wait)).await {
                if let Err(err) = result {
                    shared.abort(err);
                }
            }
            shared.slots.acquire().await;
        }

        let tree = std::mem::take(&mut *lock(&shared.tree));

        let report = tree.into_report(start.elapsed(), self.short_mode)?;
        info!(
            "Run completed in {:.1}ms - {} cases",
            report.elapsed_ms,
            report.cases.len()
        );
        Ok(report)
    }

    /// Run every benchmark matching `filter`, one after another
    pub async fn run_benchmarks(
        &self,
        registry: &Registry,
        runner: BenchmarkRunner,
        filter: &CaseFilter,
    ) -> Result<Vec<BenchmarkResult>, HarnessError> {
        let cases: Vec<_> = registry
            .benchmarks()
            .iter()
            .filter(|b| filter.matches(0, b.name()))
            .cloned()
            .collect();

        info!("Running {} benchmarks", cases.len());

        tokio::task::spawn_blocking(move || {
            cases
                .iter()
                .map(|case| {
                    panic::catch_unwind(AssertUnwindSafe(|| runner.run(case))).map_err(
                        |payload| HarnessError::Panicked {
                            path: case.name().to_string(),
                            message: panic_message(payload.as_ref()),
                        },
                    )
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .await?
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::models::Outcome;

    #[test]
    fn test_executor_builder() {
        let executor = Executor::new()
            .max_parallel(0)
            .short_mode(true)
            .filter(CaseFilter::new("Add"));

        assert_eq!(executor.max_parallel, 1);
        assert!(executor.short_mode);
        assert!(!executor.filter.is_empty());
    }

    #[test]
    fn test_run_sequential_cases() {
        let mut registry = Registry::new();
        registry.register("TestAdd", |_| Ok(())).unwrap();
        registry
            .register("TestBroken", |t| {
                t.fail("first");
                t.fail("second");
                Ok(())
            })
            .unwrap();

        let report = tokio_test::block_on(Executor::new().run(&registry)).unwrap();

        assert_eq!(report.outcome_of("TestAdd"), Some(Outcome::Passed));
        assert_eq!(report.outcome_of("TestBroken"), Some(Outcome::Failed));
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[1].message, "second");
    }

    #[test]
    fn test_filter_skips_unmatched_cases() {
        let mut registry = Registry::new();
        registry.register("TestAdd", |_| Ok(())).unwrap();
        registry.register("TestMultiply", |_| Ok(())).unwrap();

        let executor = Executor::new().filter(CaseFilter::new("Mul"));
        let report = tokio_test::block_on(executor.run(&registry)).unwrap();

        assert_eq!(report.cases.len(), 1);
        assert_eq!(report.cases[0].path, "TestMultiply");
    }
}
