//! Case registry
//!
//! Collects named top-level test cases and benchmarks. Registration never runs
//! anything; the executor walks the registry later.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::benchmark::Bencher;
use crate::executor::{CaseResult, TestContext};
use crate::models::normalize_name;

/// Registration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate case name: {0}")]
    DuplicateName(String),

    #[error("Case name must not be empty")]
    EmptyName,
}

/// A unit of test logic run with a [`TestContext`]
pub trait Runnable: Send + Sync {
    fn run(&self, t: &mut TestContext) -> CaseResult;
}

impl<F> Runnable for F
where
    F: Fn(&mut TestContext) -> CaseResult + Send + Sync,
{
    fn run(&self, t: &mut TestContext) -> CaseResult {
        self(t)
    }
}

/// A unit of benchmark logic run with a [`Bencher`]
pub trait Benchmarkable: Send + Sync {
    fn run(&self, b: &mut Bencher);
}

impl<F> Benchmarkable for F
where
    F: Fn(&mut Bencher) + Send + Sync,
{
    fn run(&self, b: &mut Bencher) {
        self(b)
    }
}

/// A registered top-level test case
#[derive(Clone)]
pub struct TestCase {
    name: String,
    work: Arc<dyn Runnable>,
}

impl TestCase {
    pub fn new(name: impl Into<String>, work: Arc<dyn Runnable>) -> Self {
        Self {
            name: name.into(),
            work,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn work(&self) -> Arc<dyn Runnable> {
        Arc::clone(&self.work)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase").field("name", &self.name).finish()
    }
}

/// A registered benchmark
#[derive(Clone)]
pub struct BenchmarkCase {
    name: String,
    work: Arc<dyn Benchmarkable>,
}

impl BenchmarkCase {
    pub fn new(name: impl Into<String>, work: Arc<dyn Benchmarkable>) -> Self {
        Self {
            name: name.into(),
            work,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn work(&self) -> &dyn Benchmarkable {
        self.work.as_ref()
    }
}

impl fmt::Debug for BenchmarkCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BenchmarkCase")
            .field("name", &self.name)
            .finish()
    }
}

/// Handle returned from a successful registration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseHandle {
    index: usize,
    name: String,
}

impl CaseHandle {
    /// Position in registration order
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Explicit registry of test cases and benchmarks
#[derive(Default)]
pub struct Registry {
    cases: Vec<TestCase>,
    benchmarks: Vec<BenchmarkCase>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure as a top-level test case
    pub fn register<F>(&mut self, name: &str, work: F) -> Result<CaseHandle, RegistryError>
    where
        F: Fn(&mut TestContext) -> CaseResult + Send + Sync + 'static,
    {
        self.register_runnable(name, Arc::new(work))
    }

    /// Register any [`Runnable`] as a top-level test case
    pub fn register_runnable(
        &mut self,
        name: &str,
        work: Arc<dyn Runnable>,
    ) -> Result<CaseHandle, RegistryError> {
        let name = checked_name(name, self.cases.iter().map(TestCase::name))?;
        debug!("Registered case {}", name);

        self.cases.push(TestCase::new(name.clone(), work));
        Ok(CaseHandle {
            index: self.cases.len() - 1,
            name,
        })
    }

    /// Register a closure as a benchmark
    pub fn register_benchmark<F>(
        &mut self,
        name: &str,
        work: F,
    ) -> Result<CaseHandle, RegistryError>
    where
        F: Fn(&mut Bencher) + Send + Sync + 'static,
    {
        let name = checked_name(name, self.benchmarks.iter().map(BenchmarkCase::name))?;
        debug!("Registered benchmark {}", name);

        self.benchmarks
            .push(BenchmarkCase::new(name.clone(), Arc::new(work)));
        Ok(CaseHandle {
            index: self.benchmarks.len() - 1,
            name,
        })
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn benchmarks(&self) -> &[BenchmarkCase] {
        &self.benchmarks
    }

    /// Number of registered test cases
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// Normalize `name` and reject it if empty or already taken
pub(crate) fn checked_name<'a>(
    name: &str,
    mut existing: impl Iterator<Item = &'a str>,
) -> Result<String, RegistryError> {
    let name = normalize_name(name);
    if name.is_empty() {
        return Err(RegistryError::EmptyName);
    }
    if existing.any(|n| n == name) {
        return Err(RegistryError::DuplicateName(name));
    }
    Ok(name)
}
