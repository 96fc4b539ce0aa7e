//! Time-derived, strictly increasing tokens

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Issues millisecond-timestamp tokens that never repeat within a process.
///
/// When two tokens are requested inside the same millisecond (or the wall clock
/// steps backwards) the previous token plus one is issued instead. A floor at
/// `u64::MAX` has no successor; the clock then restarts from the current time.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicU64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock that never issues a token at or below `floor`
    pub fn starting_after(floor: u64) -> Self {
        Self {
            last: AtomicU64::new(floor),
        }
    }

    /// Next token
    pub fn next(&self) -> u64 {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = match last.checked_add(1) {
                Some(after) => now.max(after),
                None => now,
            };
            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }

    /// Raise the floor so later tokens stay above `value`
    pub fn observe(&self, value: u64) {
        self.last.fetch_max(value, Ordering::AcqRel);
    }
}
