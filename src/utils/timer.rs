//! Timer utilities
//!
//! Provides a pausable timer used for benchmark measurement.

use std::time::{Duration, Instant};

/// Timer that accumulates elapsed time across start/stop cycles
#[derive(Debug)]
pub struct Timer {
    running_since: Option<Instant>,
    accumulated: Duration,
}

impl Timer {
    /// Create and start a new timer
    pub fn start() -> Self {
        Self {
            running_since: Some(Instant::now()),
            accumulated: Duration::ZERO,
        }
    }

    /// Resume measuring. No-op if already running.
    pub fn resume(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    /// Stop measuring and keep the time collected so far
    pub fn pause(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += since.elapsed();
        }
    }

    /// Zero the timer, keeping its running state
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        if self.running_since.is_some() {
            self.running_since = Some(Instant::now());
        }
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        match self.running_since {
            Some(since) => self.accumulated + since.elapsed(),
            None => self.accumulated,
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}
