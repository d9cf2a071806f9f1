// =============================================================================
// Per-provider rate limit tracker
// =============================================================================
//
// A simple per-second / per-minute token bucket, generalized from the
// exchange-specific weight tracker in `binance::rate_limit` for use by any
// provider client the router dispatches to.

use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

fn now_secs() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

/// Tracks call counts in rolling one-second and one-minute windows plus an
/// optional cooldown deadline set after a `rate_limited` response.
pub struct RateLimitTracker {
    per_second_limit: u32,
    per_minute_limit: u32,
    second_window_start: AtomicI64,
    second_count: AtomicU32,
    minute_window_start: AtomicI64,
    minute_count: AtomicU32,
    cooldown_until: AtomicI64,
}

impl RateLimitTracker {
    pub fn new(per_second_limit: u32, per_minute_limit: u32) -> Self {
        let now = now_secs();
        Self {
            per_second_limit,
            per_minute_limit,
            second_window_start: AtomicI64::new(now),
            second_count: AtomicU32::new(0),
            minute_window_start: AtomicI64::new(now),
            minute_count: AtomicU32::new(0),
            cooldown_until: AtomicI64::new(0),
        }
    }

    /// Roll the windows forward if they have expired, resetting counters.
    fn roll_windows(&self) {
        let now = now_secs();
        let sec_start = self.second_window_start.load(Ordering::Relaxed);
        if now - sec_start >= 1 {
            self.second_window_start.store(now, Ordering::Relaxed);
            self.second_count.store(0, Ordering::Relaxed);
        }
        let min_start = self.minute_window_start.load(Ordering::Relaxed);
        if now - min_start >= 60 {
            self.minute_window_start.store(now, Ordering::Relaxed);
            self.minute_count.store(0, Ordering::Relaxed);
        }
    }

    /// Whether a request may be sent right now.
    pub fn can_send(&self) -> bool {
        if now_secs() < self.cooldown_until.load(Ordering::Relaxed) {
            return false;
        }
        self.roll_windows();
        self.second_count.load(Ordering::Relaxed) < self.per_second_limit
            && self.minute_count.load(Ordering::Relaxed) < self.per_minute_limit
    }

    /// Record that a request was sent.
    pub fn record_sent(&self) {
        self.roll_windows();
        self.second_count.fetch_add(1, Ordering::Relaxed);
        self.minute_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Enter a cooldown for `secs` seconds after a `rate_limited` response.
    pub fn cooldown_for(&self, secs: i64) {
        self.cooldown_until.store(now_secs() + secs.max(1), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_calls_under_the_limit() {
        let tracker = RateLimitTracker::new(2, 100);
        assert!(tracker.can_send());
        tracker.record_sent();
        assert!(tracker.can_send());
        tracker.record_sent();
        assert!(!tracker.can_send());
    }

    #[test]
    fn cooldown_blocks_further_sends() {
        let tracker = RateLimitTracker::new(100, 100);
        tracker.cooldown_for(5);
        assert!(!tracker.can_send());
    }
}
