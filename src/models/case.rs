//! Case outcome models
//!
//! Defines case identities, outcomes and the frozen records produced by a run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Index of a case inside the run's case tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaseId(pub usize);

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Final state of a case
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

impl Outcome {
    pub fn symbol(&self) -> &'static str {
        match self {
            Outcome::Passed => "✓",
            Outcome::Failed => "✗",
            Outcome::Skipped => "○",
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Failed)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Passed => write!(f, "PASS"),
            Outcome::Failed => write!(f, "FAIL"),
            Outcome::Skipped => write!(f, "SKIP"),
        }
    }
}

/// Normalize a case name segment.
///
/// Spaces become underscores so paths stay shell and filter friendly.
pub fn normalize_name(name: &str) -> String {
    name.trim().replace(' ', "_")
}

/// Join a parent path and a child segment
pub fn join_path(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}/{name}"),
        None => name.to_string(),
    }
}

/// A single recorded failure
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub path: String,
    pub message: String,
}

impl fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Frozen view of a finished case
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: CaseId,
    pub parent: Option<CaseId>,
    pub path: String,
    pub depth: usize,
    pub outcome: Outcome,
    pub parallel: bool,
    pub duration_ms: f64,
    /// Failure messages recorded by this case, in order
    pub failures: Vec<String>,
    /// Skip reason, if the case skipped itself
    pub skip_reason: Option<String>,
    pub logs: Vec<String>,
}

impl CaseRecord {
    /// Last path segment
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_ms / 1000.0)
    }
}

impl fmt::Display for CaseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{:.2}ms]",
            self.outcome.symbol(),
            self.path,
            self.duration_ms
        )?;
        if let Some(first) = self.failures.first() {
            write!(f, " - {first}")?;
        } else if let Some(reason) = &self.skip_reason {
            write!(f, " - {reason}")?;
        }
        Ok(())
    }
}

/// Everything a single executor invocation produced
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Case records in tree order (parents before children, siblings in registration order)
    pub cases: Vec<CaseRecord>,
    /// Failures in the order they were recorded
    pub failures: Vec<FailureDetail>,
    pub elapsed_ms: f64,
    pub short_mode: bool,
}

impl ExecutionReport {
    pub fn get(&self, path: &str) -> Option<&CaseRecord> {
        self.cases.iter().find(|c| c.path == path)
    }

    pub fn outcome_of(&self, path: &str) -> Option<Outcome> {
        self.get(path).map(|c| c.outcome)
    }

    /// Top-level case records
    pub fn roots(&self) -> impl Iterator<Item = &CaseRecord> {
        self.cases.iter().filter(|c| c.parent.is_none())
    }

    pub fn children_of(&self, id: CaseId) -> impl Iterator<Item = &CaseRecord> {
        self.cases.iter().filter(move |c| c.parent == Some(id))
    }

    pub fn has_failures(&self) -> bool {
        self.cases.iter().any(|c| c.outcome == Outcome::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: usize, parent: Option<usize>, path: &str, outcome: Outcome) -> CaseRecord {
        CaseRecord {
            id: CaseId(id),
            parent: parent.map(CaseId),
            path: path.to_string(),
            depth: path.matches('/').count(),
            outcome,
            parallel: false,
            duration_ms: 0.5,
            failures: Vec::new(),
            skip_reason: None,
            logs: Vec::new(),
        }
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("division by zero"), "division_by_zero");
        assert_eq!(normalize_name("  success "), "success");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path(None, "TestAdd"), "TestAdd");
        assert_eq!(join_path(Some("Parallel/group"), "test1"), "Parallel/group/test1");
    }

    #[test]
    fn test_record_name() {
        let r = record(2, Some(1), "Parallel/group/test1", Outcome::Passed);
        assert_eq!(r.name(), "test1");
        assert_eq!(r.depth, 2);
    }

    #[test]
    fn test_outcome_success() {
        assert!(Outcome::Passed.is_success());
        assert!(Outcome::Skipped.is_success());
        assert!(!Outcome::Failed.is_success());
        assert_eq!(Outcome::Failed.to_string(), "FAIL");
    }

    #[test]
    fn test_report_navigation() {
        let report = ExecutionReport {
            cases: vec![
                record(0, None, "TestDivide", Outcome::Failed),
                record(1, Some(0), "TestDivide/success", Outcome::Passed),
                record(2, Some(0), "TestDivide/zero", Outcome::Failed),
                record(3, None, "TestAdd", Outcome::Passed),
            ],
            failures: Vec::new(),
            elapsed_ms: 1.0,
            short_mode: false,
        };

        assert_eq!(report.roots().count(), 2);
        assert_eq!(report.children_of(CaseId(0)).count(), 2);
        assert_eq!(report.outcome_of("TestDivide/zero"), Some(Outcome::Failed));
        assert!(report.has_failures());
    }
}
