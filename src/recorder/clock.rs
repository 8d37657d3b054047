//! Session time keeping.
//!
//! All timestamps are monotonic nanoseconds since the clock's construction.
//! The session zero point (`abs_start`) is the first enter observed by any
//! thread; offsets in the artifact are relative to it.

use dashmap::DashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

/// Zero point, running duration and thread set of one session
#[derive(Debug)]
pub struct SessionClock {
    epoch: Instant,
    abs_start: OnceLock<u64>,
    duration: AtomicU64,
    thread_ids: DashSet<u64>,
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            abs_start: OnceLock::new(),
            duration: AtomicU64::new(0),
            thread_ids: DashSet::new(),
        }
    }

    /// Monotonic nanoseconds since the clock was created
    pub fn now(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Session zero point, fixing it on first call.
    ///
    /// First writer wins; every later caller sees the same value.
    pub fn mark_start(&self) -> u64 {
        *self.abs_start.get_or_init(|| self.now())
    }

    pub fn abs_start(&self) -> Option<u64> {
        self.abs_start.get().copied()
    }

    /// Offset of `timestamp` from the session zero point
    pub fn offset(&self, timestamp: u64) -> i64 {
        let start = self.abs_start().unwrap_or(0);
        timestamp as i64 - start as i64
    }

    /// Raise the session duration to cover an exit at `timestamp`
    pub fn observe_exit(&self, timestamp: u64) {
        let start = self.abs_start().unwrap_or(0);
        self.duration
            .fetch_max(timestamp.saturating_sub(start), Ordering::AcqRel);
    }

    pub fn duration(&self) -> u64 {
        self.duration.load(Ordering::Acquire)
    }

    pub fn observe_thread(&self, thread_id: u64) {
        self.thread_ids.insert(thread_id);
    }

    /// Observed thread ids, ascending
    pub fn thread_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.thread_ids.iter().map(|id| *id).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_set_once() {
        let clock = SessionClock::new();
        assert_eq!(clock.abs_start(), None);

        let first = clock.mark_start();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let second = clock.mark_start();

        assert_eq!(first, second);
        assert_eq!(clock.abs_start(), Some(first));
    }

    #[test]
    fn test_duration_is_monotonic() {
        let clock = SessionClock::new();
        let start = clock.mark_start();

        clock.observe_exit(start + 500);
        clock.observe_exit(start + 200);
        assert_eq!(clock.duration(), 500);

        clock.observe_exit(start + 900);
        assert_eq!(clock.duration(), 900);
    }

    #[test]
    fn test_offsets_relative_to_start() {
        let clock = SessionClock::new();
        let start = clock.mark_start();
        assert_eq!(clock.offset(start), 0);
        assert_eq!(clock.offset(start + 42), 42);
    }

    #[test]
    fn test_thread_ids_deduplicated_and_sorted() {
        let clock = SessionClock::new();
        for id in [9, 3, 9, 1, 3] {
            clock.observe_thread(id);
        }
        assert_eq!(clock.thread_ids(), vec![1, 3, 9]);
    }
}
