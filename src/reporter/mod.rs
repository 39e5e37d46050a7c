//! Outcome aggregation
//!
//! Turns an execution report into pass/fail/skip counts and an ordered list of
//! failure details.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{ExecutionReport, FailureDetail, Outcome};

/// Aggregated counts for a run. Nested cases count like top-level ones.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// `(case path, message)` in the order failures were recorded
    pub failure_details: Vec<FailureDetail>,
    pub elapsed_ms: f64,
}

impl Summary {
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Skip: {} | Duration: {:.2}s",
            self.total,
            self.passed,
            self.failed,
            self.skipped,
            self.elapsed_ms / 1000.0
        )
    }
}

pub struct Reporter;

impl Reporter {
    /// Count outcomes per case and collect failure details
    pub fn summarize(report: &ExecutionReport) -> Summary {
        let count = |outcome: Outcome| report.cases.iter().filter(|c| c.outcome == outcome).count();

        Summary {
            total: report.cases.len(),
            passed: count(Outcome::Passed),
            failed: count(Outcome::Failed),
            skipped: count(Outcome::Skipped),
            failure_details: report.failures.clone(),
            elapsed_ms: report.elapsed_ms,
        }
    }
}
