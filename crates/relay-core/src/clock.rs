//! Millisecond wall clock that never goes backwards.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

/// Process clock handing out non-decreasing epoch milliseconds.
///
/// Wall-clock adjustments backwards are absorbed by repeating the last
/// observed value.
#[derive(Debug, Default)]
pub struct Clock {
    last: AtomicU64,
}

impl Clock {
    /// Create a new clock.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Current time in milliseconds since the Unix epoch.
    pub fn now_ms(&self) -> u64 {
        let wall = wall_ms();
        let prev = self.last.fetch_max(wall, Ordering::AcqRel);
        prev.max(wall)
    }
}

/// Raw wall-clock milliseconds since the Unix epoch.
#[must_use]
pub fn wall_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_decreasing() {
        let clock = Clock::new();
        let mut prev = 0;
        for _ in 0..1000 {
            let now = clock.now_ms();
            assert!(now >= prev);
            prev = now;
        }
    }

    #[test]
    fn test_absorbs_backwards_jump() {
        let clock = Clock::new();
        let future = wall_ms() + 60_000;
        clock.last.store(future, Ordering::Relaxed);
        assert_eq!(clock.now_ms(), future);
    }
}
