//! casekit - a nested, parallel-aware unit test harness
//!
//! Cases are registered explicitly in a [`Registry`], run by an [`Executor`]
//! and summarized by the [`Reporter`].
//!
//! ## Features
//!
//! - Subtests built lazily while a case runs (`t.run(name, ..)`)
//! - Parallel subtests released together once their parent's body returns
//! - Cleanup hooks run last-in first-out, whatever the outcome
//! - Non-fatal (`fail`), fatal (`fatal`) and skip (`skip`) reporting
//! - Short mode and path filters
//! - Micro-benchmarks with automatic iteration growth
//!
//! ## Usage
//!
//! ```no_run
//! use casekit::{Executor, Registry, Reporter};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let mut registry = Registry::new();
//! registry.register("TestDivide", |t| {
//!     t.run("by zero", |t| {
//!         if casekit::sample::divide(1, 0).is_ok() {
//!             return t.fatal("expected an error");
//!         }
//!         Ok(())
//!     });
//!     Ok(())
//! })?;
//!
//! let report = Executor::new().run(&registry).await?;
//! let summary = Reporter::summarize(&report);
//! assert_eq!(summary.failed, 0);
//! # Ok(())
//! # }
//! ```

pub mod benchmark;
pub mod config;
pub mod executor;
pub mod models;
pub mod output;
pub mod registry;
pub mod reporter;
pub mod sample;
pub mod utils;

pub use benchmark::{Bencher, BenchmarkConfig, BenchmarkResult, BenchmarkRunner};
pub use executor::{CaseFilter, CaseResult, Executor, Halt, HarnessError, TestContext};
pub use models::{CaseRecord, ExecutionReport, FailureDetail, Outcome};
pub use registry::{CaseHandle, Registry, RegistryError};
pub use reporter::{Reporter, Summary};
