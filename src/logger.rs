//! Utilities for logging rewriting statistics.
use std::time::{Duration, Instant};

use log::info;

use crate::rewriter::RunCounters;

/// Log the run counters at a fixed interval.
///
/// The rewriter runs on a single thread, so the logger is polled from the
/// packet loop instead of running in the background.
pub struct StatisticsLogger {
    interval: Duration,
    last_log: Instant,
}

impl StatisticsLogger {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_log: Instant::now(),
        }
    }

    pub fn tick(&mut self, counters: &RunCounters) {
        if self.last_log.elapsed() >= self.interval {
            info!("{}", counters);
            self.last_log = Instant::now();
        }
    }

    pub fn stop(self, counters: &RunCounters) {
        info!("{}", counters);
    }
}
