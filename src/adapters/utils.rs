//! Shared helpers for the network adapters.

/// Returns `true` if every byte of `s` is in the printable ASCII range
/// `0x20..=0x7E` (space through tilde, inclusive).
pub(super) fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// Fixed-interval retry limiter.
///
/// The first attempt is allowed immediately; later attempts only once
/// `interval_ms` has passed since the previous one. Checking never blocks.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectGate {
    interval_ms: u64,
    last_attempt_ms: Option<u64>,
}

impl ReconnectGate {
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_attempt_ms: None,
        }
    }

    /// Returns `true` and records the attempt if one is due at `now_ms`.
    pub fn should_attempt(&mut self, now_ms: u64) -> bool {
        let due = self
            .last_attempt_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= self.interval_ms);
        if due {
            self.last_attempt_ms = Some(now_ms);
        }
        due
    }

    /// Forget the last attempt so the next check is immediately due.
    pub fn reset(&mut self) {
        self.last_attempt_ms = None;
    }
}
