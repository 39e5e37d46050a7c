//! Per-case handle passed to every work unit

use futures::future::join_all;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};

use super::error::{panic_message, HarnessError};
use super::filter::CaseFilter;
use super::parallel::{wait_gate, ChildSignal, Gate, ParallelSlots};
use super::runner::{spawn_case, CaseJoin};
use super::tree::{lock, CaseTree};
use crate::models::{normalize_name, CaseId, Outcome};
use crate::registry::Runnable;

/// Result of a work unit. `Err` means the case halted early.
pub type CaseResult = Result<(), Halt>;

/// Why a case stopped before the end of its body
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HaltKind {
    Fatal,
    Skip,
}

/// Unwind signal produced by [`TestContext::fatal`] and [`TestContext::skip`].
///
/// It cannot be built outside the harness, so a body can only halt through
/// the context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Halt {
    kind: HaltKind,
}

impl Halt {
    fn new(kind: HaltKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> HaltKind {
        self.kind
    }
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            HaltKind::Fatal => write!(f, "case stopped by fatal failure"),
            HaltKind::Skip => write!(f, "case skipped"),
        }
    }
}

impl std::error::Error for Halt {}

/// State shared by every case of one run
pub(crate) struct RunShared {
    pub tree: Mutex<CaseTree>,
    pub slots: ParallelSlots,
    pub runtime: Handle,
    pub short_mode: bool,
    pub filter: CaseFilter,
}

impl RunShared {
    pub fn is_aborted(&self) -> bool {
        lock(&self.tree).is_aborted()
    }

    pub fn abort(&self, err: HarnessError) {
        warn!("Aborting run: {}", err);
        lock(&self.tree).abort(err);
    }
}

type CleanupHook = Box<dyn FnOnce() + Send>;

/// Handle given to a running case
pub struct TestContext {
    id: CaseId,
    path: String,
    depth: usize,
    shared: Arc<RunShared>,
    signal: Option<oneshot::Sender<ChildSignal>>,
    parent_gate: Option<watch::Receiver<bool>>,
    gate: Gate,
    parallel: bool,
    parallel_children: Vec<CaseJoin>,
    cleanups: Vec<CleanupHook>,
}

impl TestContext {
    pub(crate) fn new(
        shared: Arc<RunShared>,
        id: CaseId,
        path: String,
        depth: usize,
        signal: oneshot::Sender<ChildSignal>,
        parent_gate: watch::Receiver<bool>,
    ) -> Self {
        Self {
            id,
            path,
            depth,
            shared,
            signal: Some(signal),
            parent_gate: Some(parent_gate),
            gate: Gate::new(),
            parallel: false,
            parallel_children: Vec::new(),
            cleanups: Vec::new(),
        }
    }

    /// Full slash-separated path of this case
    pub fn name(&self) -> &str {
        &self.path
    }

    /// Record a failure and keep going
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!("{}: {}", self.path, message);
        lock(&self.shared.tree).record_failure(self.id, message);
    }

    /// Record a failure and halt the case. Return the result from the body.
    pub fn fatal(&mut self, message: impl Into<String>) -> CaseResult {
        self.fail(message);
        Err(Halt::new(HaltKind::Fatal))
    }

    /// Mark the case skipped and halt it. Return the result from the body.
    pub fn skip(&mut self, reason: impl Into<String>) -> CaseResult {
        let reason = reason.into();
        debug!("{}: skipped: {}", self.path, reason);
        lock(&self.shared.tree).record_skip(self.id, reason);
        Err(Halt::new(HaltKind::Skip))
    }

    /// Has this case, or any finished child, failed?
    pub fn failed(&self) -> bool {
        lock(&self.shared.tree).is_failed(self.id)
    }

    pub fn log(&mut self, line: impl Into<String>) {
        lock(&self.shared.tree).log(self.id, line.into());
    }

    pub fn is_short_mode(&self) -> bool {
        self.shared.short_mode
    }

    /// Compare and record a `got/want` failure on mismatch
    pub fn expect_eq<T: PartialEq + fmt::Debug>(&mut self, got: T, want: T) -> bool {
        if got == want {
            return true;
        }
        self.fail(format!("got {got:?}; want {want:?}"));
        false
    }

    /// Register a hook to run when the case finishes. Hooks run last-in first-out.
    pub fn cleanup<F>(&mut self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cleanups.push(Box::new(hook));
    }

    /// Let the parent continue and resume once the parent's body has returned.
    pub fn parallel(&mut self) {
        if self.parallel {
            self.fail("parallel() called more than once");
            return;
        }
        self.parallel = true;
        lock(&self.shared.tree).mark_parallel(self.id);

        debug!("=== PAUSE {}", self.path);
        if let Some(signal) = self.signal.take() {
            let _ = signal.send(ChildSignal::Parallel);
        }
        if let Some(gate) = self.parent_gate.take() {
            wait_gate(&self.shared.runtime, gate);
        }
        self.shared.slots.acquire_blocking(&self.shared.runtime);
        debug!("=== CONT  {}", self.path);
    }

    /// Run `work` as a nested case.
    ///
    /// Blocks until the child finishes or calls `parallel()`. Returns false if
    /// the child failed or could not be registered.
    pub fn run<F>(&mut self, name: &str, work: F) -> bool
    where
        F: Fn(&mut TestContext) -> CaseResult + Send + Sync + 'static,
    {
        self.run_runnable(name, Arc::new(work))
    }

    pub fn run_runnable(&mut self, name: &str, work: Arc<dyn Runnable>) -> bool {
        if !self
            .shared
            .filter
            .matches(self.depth + 1, &normalize_name(name))
        {
            return true;
        }

        let (id, path) = {
            let mut tree = lock(&self.shared.tree);
            if tree.is_aborted() {
                return false;
            }
            match tree.add(Some(self.id), name) {
                Ok(id) => (id, tree.path(id).to_string()),
                Err(err) => {
                    let err = HarnessError::registration(Some(&self.path), err);
                    warn!("{}", err);
                    tree.record_failure(self.id, err.to_string());
                    tree.abort(err);
                    return false;
                }
            }
        };

        let spawned = spawn_case(
            Arc::clone(&self.shared),
            id,
            path,
            self.depth + 1,
            work,
            self.gate.subscribe(),
        );
        let (handle, signal) = match spawned {
            Ok(spawned) => spawned,
            Err(err) => {
                let mut tree = lock(&self.shared.tree);
                tree.record_failure(id, err.to_string());
                tree.finalize(id);
                tree.abort(err);
                return false;
            }
        };

        match signal.blocking_recv() {
            Ok(ChildSignal::Parallel) => {
                self.parallel_children.push(handle);
                true
            }
            Ok(ChildSignal::Finished(outcome)) => {
                self.join(handle);
                outcome != Outcome::Failed
            }
            Err(_) => {
                self.join(handle);
                false
            }
        }
    }

    fn join(&self, handle: CaseJoin) {
        if let Err(err) = self.shared.runtime.block_on(handle.wait()) {
            self.shared.abort(err);
        }
    }

    pub(crate) fn record_panic(&mut self, origin: &str, message: String) {
        let mut tree = lock(&self.shared.tree);
        tree.record_failure(self.id, format!("{origin} panicked: {message}"));
        tree.abort(HarnessError::Panicked {
            path: self.path.clone(),
            message,
        });
    }

    /// Release and join parallel children, run cleanups, freeze the outcome and
    /// tell the parent.
    pub(crate) fn finish(mut self) {
        self.gate.open();

        let children = std::mem::take(&mut self.parallel_children);
        if !children.is_empty() {
            debug!(
                "{} waiting on {} parallel cases",
                self.path,
                children.len()
            );
            self.shared.slots.release();
            let joined = join_all(children.into_iter().map(CaseJoin::wait));
            for result in self.shared.runtime.block_on(joined) {
                if let Err(err) = result {
                    self.shared.abort(err);
                }
            }
            self.shared.slots.acquire_blocking(&self.shared.runtime);
        }

        while let Some(hook) = self.cleanups.pop() {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(hook)) {
                self.record_panic("cleanup", panic_message(payload.as_ref()));
            }
        }

        let outcome = lock(&self.shared.tree).finalize(self.id);
        debug!("--- {}: {}", outcome, self.path);

        if self.parallel {
            self.shared.slots.release();
        }
        if let Some(signal) = self.signal.take() {
            let _ = signal.send(ChildSignal::Finished(outcome));
        }
    }
}

impl fmt::Debug for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("parallel", &self.parallel)
            .finish()
    }
}
