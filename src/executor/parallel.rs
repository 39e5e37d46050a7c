//! Parallel scheduling primitives
//!
//! Parallel cases wait for their parent's body to return (a `watch` gate), then
//! for a free slot. Slot accounting treats the driver as already running one
//! case, so a semaphore with `max_parallel - 1` permits bounds concurrency to
//! `max_parallel`. Any case blocked on its parallel children hands its slot
//! back while it waits.

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{watch, Semaphore};

use crate::models::Outcome;

/// What a child reports to the parent blocked in `run`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ChildSignal {
    /// The child called `parallel()`; the parent may continue
    Parallel,
    /// The child finished with this outcome
    Finished(Outcome),
}

/// Released once the owning case's body has returned
pub(crate) struct Gate {
    tx: watch::Sender<bool>,
}

impl Gate {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    pub fn open(&self) {
        self.tx.send_replace(true);
    }
}

/// Block the current worker until `gate` opens or its owner goes away
pub(crate) fn wait_gate(runtime: &Handle, mut gate: watch::Receiver<bool>) {
    let _ = runtime.block_on(gate.wait_for(|open| *open));
}

/// Counter of running parallel cases
#[derive(Clone)]
pub(crate) struct ParallelSlots {
    semaphore: Arc<Semaphore>,
    max: usize,
}

impl ParallelSlots {
    pub fn new(max_parallel: usize) -> Self {
        let max = max_parallel.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max - 1)),
            max,
        }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Take a slot from a case worker thread
    pub fn acquire_blocking(&self, runtime: &Handle) {
        runtime.block_on(self.acquire());
    }

    pub async fn acquire(&self) {
        // The semaphore is never closed
        if let Ok(permit) = self.semaphore.acquire().await {
            permit.forget();
        }
    }

    pub fn release(&self) {
        self.semaphore.add_permits(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_reserve_driver() {
        let slots = ParallelSlots::new(4);
        assert_eq!(slots.max(), 4);
        assert_eq!(slots.available(), 3);

        let slots = ParallelSlots::new(0);
        assert_eq!(slots.max(), 1);
        assert_eq!(slots.available(), 0);
    }

    #[test]
    fn test_acquire_release() {
        let slots = ParallelSlots::new(2);
        tokio_test::block_on(slots.acquire());
        assert_eq!(slots.available(), 0);

        slots.release();
        assert_eq!(slots.available(), 1);
    }

    #[test]
    fn test_gate_opens() {
        let gate = Gate::new();
        let mut rx = gate.subscribe();
        assert!(!*rx.borrow());

        gate.open();
        tokio_test::block_on(async {
            assert!(rx.wait_for(|open| *open).await.is_ok());
        });
    }
}
