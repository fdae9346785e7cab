//! Bounded-wait primitive.
//!
//! Replaces open-coded "spin until condition or timeout" loops with a
//! deadline that is checked on every poll.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
        }
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Poll `cond` until it returns `true` or the deadline passes.
    ///
    /// Returns `true` if the condition was met in time. The condition is
    /// always polled at least once, even on an already-expired deadline.
    pub fn wait_until(&self, mut cond: impl FnMut() -> bool) -> bool {
        loop {
            if cond() {
                return true;
            }
            if self.expired() {
                return false;
            }
        }
    }
}
