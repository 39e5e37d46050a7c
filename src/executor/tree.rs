//! Case tree arena
//!
//! Cases are created lazily while the run walks the suite depth-first. Each node
//! refers to its parent by index; the tree owns every node. One mutex guards the
//! whole tree and the failure log, which serializes contributions from parallel
//! cases.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::error::HarnessError;
use crate::models::{
    join_path, CaseId, CaseRecord, ExecutionReport, FailureDetail, Outcome,
};
use crate::registry::{checked_name, RegistryError};

#[derive(Debug)]
struct CaseNode {
    name: String,
    path: String,
    parent: Option<CaseId>,
    depth: usize,
    children: Vec<CaseId>,
    failures: Vec<String>,
    skip_reason: Option<String>,
    logs: Vec<String>,
    parallel: bool,
    started: Instant,
    duration: Duration,
    outcome: Option<Outcome>,
}

#[derive(Debug, Default)]
pub(crate) struct CaseTree {
    nodes: Vec<CaseNode>,
    roots: Vec<CaseId>,
    failure_log: Vec<FailureDetail>,
    abort: Option<HarnessError>,
}

impl CaseTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a case under `parent`, rejecting duplicate sibling names
    pub fn add(&mut self, parent: Option<CaseId>, name: &str) -> Result<CaseId, RegistryError> {
        let siblings = match parent {
            Some(p) => &self.nodes[p.0].children,
            None => &self.roots,
        };
        let name = checked_name(name, siblings.iter().map(|id| self.nodes[id.0].name.as_str()))?;

        let id = CaseId(self.nodes.len());
        let (path, depth) = match parent {
            Some(p) => {
                let node = &self.nodes[p.0];
                (join_path(Some(&node.path), &name), node.depth + 1)
            }
            None => (name.clone(), 0),
        };

        self.nodes.push(CaseNode {
            name,
            path,
            parent,
            depth,
            children: Vec::new(),
            failures: Vec::new(),
            skip_reason: None,
            logs: Vec::new(),
            parallel: false,
            started: Instant::now(),
            duration: Duration::ZERO,
            outcome: None,
        });

        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.roots.push(id),
        }
        Ok(id)
    }

    pub fn path(&self, id: CaseId) -> &str {
        &self.nodes[id.0].path
    }

    pub fn depth(&self, id: CaseId) -> usize {
        self.nodes[id.0].depth
    }

    pub fn record_failure(&mut self, id: CaseId, message: String) {
        let node = &mut self.nodes[id.0];
        self.failure_log.push(FailureDetail {
            path: node.path.clone(),
            message: message.clone(),
        });
        node.failures.push(message);
    }

    /// First skip reason wins
    pub fn record_skip(&mut self, id: CaseId, reason: String) {
        let node = &mut self.nodes[id.0];
        if node.skip_reason.is_none() {
            node.skip_reason = Some(reason);
        }
    }

    pub fn log(&mut self, id: CaseId, line: String) {
        self.nodes[id.0].logs.push(line);
    }

    pub fn mark_parallel(&mut self, id: CaseId) {
        self.nodes[id.0].parallel = true;
    }

    /// True if the case or any finished child failed
    pub fn is_failed(&self, id: CaseId) -> bool {
        let node = &self.nodes[id.0];
        !node.failures.is_empty()
            || node
                .children
                .iter()
                .any(|c| self.nodes[c.0].outcome == Some(Outcome::Failed))
    }

    /// Freeze the outcome of a case. Later calls return the first outcome.
    pub fn finalize(&mut self, id: CaseId) -> Outcome {
        if let Some(outcome) = self.nodes[id.0].outcome {
            return outcome;
        }

        let outcome = if self.is_failed(id) {
            Outcome::Failed
        } else if self.nodes[id.0].skip_reason.is_some() {
            Outcome::Skipped
        } else {
            Outcome::Passed
        };

        let node = &mut self.nodes[id.0];
        node.duration = node.started.elapsed();
        node.outcome = Some(outcome);
        outcome
    }

    /// Keep the first harness error; later ones are dropped
    pub fn abort(&mut self, err: HarnessError) {
        if self.abort.is_none() {
            self.abort = Some(err);
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_some()
    }

    /// Depth-first records: parents first, siblings in registration order
    pub fn records(&self) -> Vec<CaseRecord> {
        let mut records = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<CaseId> = self.roots.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            records.push(CaseRecord {
                id,
                parent: node.parent,
                path: node.path.clone(),
                depth: node.depth,
                outcome: node.outcome.unwrap_or(Outcome::Failed),
                parallel: node.parallel,
                duration_ms: node.duration.as_secs_f64() * 1000.0,
                failures: node.failures.clone(),
                skip_reason: node.skip_reason.clone(),
                logs: node.logs.clone(),
            });
            stack.extend(node.children.iter().rev().copied());
        }

        records
    }

    pub fn into_report(
        self,
        elapsed: Duration,
        short_mode: bool,
    ) -> Result<ExecutionReport, HarnessError> {
        if let Some(err) = self.abort {
            return Err(err);
        }

        Ok(ExecutionReport {
            cases: self.records(),
            failures: self.failure_log,
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
            short_mode,
        })
    }
}

/// Lock the tree, recovering from poisoning
pub(crate) fn lock(tree: &Mutex<CaseTree>) -> MutexGuard<'_, CaseTree> {
    tree.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_follow_nesting() {
        let mut tree = CaseTree::new();
        let root = tree.add(None, "Parallel").unwrap();
        let group = tree.add(Some(root), "group").unwrap();
        let leaf = tree.add(Some(group), "test1").unwrap();

        assert_eq!(tree.path(leaf), "Parallel/group/test1");
        assert_eq!(tree.depth(leaf), 2);
    }

    #[test]
    fn test_duplicate_sibling_rejected() {
        let mut tree = CaseTree::new();
        let root = tree.add(None, "TestDivide").unwrap();
        tree.add(Some(root), "success").unwrap();

        assert!(tree.add(Some(root), "success").is_err());
        assert!(tree.add(None, "TestDivide").is_err());

        // Same name under a different parent is fine
        let other = tree.add(None, "TestOther").unwrap();
        assert!(tree.add(Some(other), "success").is_ok());
    }

    #[test]
    fn test_child_failure_fails_parent() {
        let mut tree = CaseTree::new();
        let root = tree.add(None, "TestDivide").unwrap();
        let ok = tree.add(Some(root), "success").unwrap();
        let bad = tree.add(Some(root), "zero").unwrap();

        tree.record_failure(bad, "expected error".to_string());
        assert_eq!(tree.finalize(ok), Outcome::Passed);
        assert_eq!(tree.finalize(bad), Outcome::Failed);
        assert_eq!(tree.finalize(root), Outcome::Failed);
    }

    #[test]
    fn test_failure_beats_skip() {
        let mut tree = CaseTree::new();
        let id = tree.add(None, "TestSkipped").unwrap();
        tree.record_failure(id, "broken".to_string());
        tree.record_skip(id, "short mode".to_string());

        assert_eq!(tree.finalize(id), Outcome::Failed);
    }

    #[test]
    fn test_outcome_set_once() {
        let mut tree = CaseTree::new();
        let id = tree.add(None, "TestAdd").unwrap();
        assert_eq!(tree.finalize(id), Outcome::Passed);

        tree.record_failure(id, "late".to_string());
        assert_eq!(tree.finalize(id), Outcome::Passed);
    }

    #[test]
    fn test_records_in_tree_order() {
        let mut tree = CaseTree::new();
        let a = tree.add(None, "A").unwrap();
        let b = tree.add(None, "B").unwrap();
        let a1 = tree.add(Some(a), "one").unwrap();
        let a2 = tree.add(Some(a), "two").unwrap();
        for id in [a1, a2, a, b] {
            tree.finalize(id);
        }

        let paths: Vec<_> = tree.records().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["A", "A/one", "A/two", "B"]);
    }

    #[test]
    fn test_abort_keeps_first_error() {
        let mut tree = CaseTree::new();
        tree.abort(HarnessError::Runtime("first".into()));
        tree.abort(HarnessError::Runtime("second".into()));

        let err = tree.into_report(Duration::ZERO, false).unwrap_err();
        assert_eq!(err, HarnessError::Runtime("first".into()));
    }
}
