//! Trailing request-rate tracking.
//!
//! [`QpsMonitor`] keeps one counter per second in a ring covering the last
//! `window` seconds. The ring rotates lazily: whichever call first observes a
//! new second zeroes the buckets that fell out of the window. Counters are
//! atomics, so recording a request never takes a lock.
//!
//! The result is approximate. A pulse racing a rotation may land in a bucket
//! that is about to be cleared, and concurrent callers are not coordinated.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::Instant;

#[cfg(test)]
#[path = "qps_monitor_tests.rs"]
mod tests;

/// Smallest window accepted; shorter windows are raised to this
pub const MIN_WINDOW_SECS: u64 = 5;

#[derive(Debug)]
pub struct QpsMonitor {
    origin: Instant,
    window: u64,
    latest_tick: AtomicU64,
    buckets: Vec<AtomicU64>,
}

impl QpsMonitor {
    pub fn new(window_secs: u64) -> Self {
        let window = window_secs.max(MIN_WINDOW_SECS);
        Self {
            origin: Instant::now(),
            window,
            latest_tick: AtomicU64::new(0),
            buckets: (0..window).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    pub fn window_secs(&self) -> u64 {
        self.window
    }

    /// Record one request
    pub fn pulse(&self) {
        let tick = self.current_tick();
        self.advance(tick);
        self.buckets[self.index(tick)].fetch_add(1, Ordering::AcqRel);
    }

    /// Requests per second averaged over the window, rounded down
    pub fn rate(&self) -> u64 {
        self.advance(self.current_tick());
        let total: u64 = self
            .buckets
            .iter()
            .map(|bucket| bucket.load(Ordering::Acquire))
            .sum();
        total / self.window
    }

    fn current_tick(&self) -> u64 {
        self.origin.elapsed().as_secs()
    }

    fn index(&self, tick: u64) -> usize {
        (tick % self.window) as usize
    }

    /// Move the window forward to `tick`, clearing buckets that rolled out
    fn advance(&self, tick: u64) {
        let mut latest = self.latest_tick.load(Ordering::Acquire);
        while tick > latest {
            match self.latest_tick.compare_exchange_weak(
                latest,
                tick,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    let stale = (tick - latest).min(self.window);
                    for expired in (tick + 1 - stale)..=tick {
                        self.buckets[self.index(expired)].store(0, Ordering::Release);
                    }
                    return;
                }
                Err(actual) => latest = actual,
            }
        }
    }
}
