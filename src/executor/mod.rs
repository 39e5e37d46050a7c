//! Case execution engine
//!
//! Runs registered cases with nesting, parallel scheduling, cleanup hooks and
//! skip handling, and runs benchmarks.

mod context;
mod error;
mod filter;
mod parallel;
mod runner;
mod tree;

pub use context::{CaseResult, Halt, HaltKind, TestContext};
pub use error::HarnessError;
pub use filter::CaseFilter;
pub use runner::Executor;
