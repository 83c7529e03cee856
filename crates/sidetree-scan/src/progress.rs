//! Walk progress counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Summary of one walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Nodes visited (built or checked for invalidation).
    pub visited: u64,
    /// Entries classified from disk.
    pub stat_calls: u64,
    /// Subtrees reused by reference without touching disk.
    pub reused: u64,
    /// Wall time of the walk.
    pub elapsed: Duration,
}

/// Shared counters updated from walk worker threads.
#[derive(Debug)]
pub(crate) struct WalkTracker {
    start_time: Instant,
    visited: AtomicU64,
    stat_calls: AtomicU64,
    reused: AtomicU64,
}

impl WalkTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            visited: AtomicU64::new(0),
            stat_calls: AtomicU64::new(0),
            reused: AtomicU64::new(0),
        }
    }

    /// Record a visit and return the running count, starting at 1.
    pub fn visit(&self) -> u64 {
        self.visited.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_stat(&self) {
        self.stat_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reuse(&self) {
        self.reused.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> WalkSummary {
        WalkSummary {
            visited: self.visited.load(Ordering::Relaxed),
            stat_calls: self.stat_calls.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            elapsed: self.start_time.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_counts_from_one() {
        let tracker = WalkTracker::new();
        assert_eq!(tracker.visit(), 1);
        assert_eq!(tracker.visit(), 2);
        tracker.record_stat();
        tracker.record_reuse();

        let summary = tracker.snapshot();
        assert_eq!(summary.visited, 2);
        assert_eq!(summary.stat_calls, 1);
        assert_eq!(summary.reused, 1);
    }
}
