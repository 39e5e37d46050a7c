//! Handle passed to benchmark work units

use std::hint::black_box;
use std::time::Duration;

use crate::utils::timer::Timer;

/// Iteration count and timer for one benchmark round
#[derive(Debug)]
pub struct Bencher {
    n: u64,
    timer: Timer,
}

impl Bencher {
    pub(crate) fn new(n: u64) -> Self {
        Self {
            n,
            timer: Timer::start(),
        }
    }

    /// Number of iterations this round must perform
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Call `routine` n times, keeping its output observable
    pub fn iter<T, F>(&mut self, mut routine: F)
    where
        F: FnMut() -> T,
    {
        for _ in 0..self.n {
            black_box(routine());
        }
    }

    /// Discard time measured so far, e.g. after expensive setup
    pub fn reset_timer(&mut self) {
        self.timer.reset();
    }

    pub fn stop_timer(&mut self) {
        self.timer.pause();
    }

    pub fn start_timer(&mut self) {
        self.timer.resume();
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.timer.elapsed()
    }
}
