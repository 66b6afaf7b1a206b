//! Fixed-window rate governor keyed by (identity, endpoint)
//!
//! Each key owns a counter and a reset instant. The first call in a window
//! opens it; calls up to `max_requests` are admitted; later calls are denied
//! until the window elapses. Expired windows are swept lazily, at most once
//! per cleanup interval, by whichever caller gets the sweep lock first.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default interval between sweeps of expired windows
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Longest window honoured; longer configured windows are clamped to this
pub const MAX_WINDOW_SECONDS: u64 = 366 * 24 * 60 * 60;

/// Limit applied to one endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_seconds: u64,
}

impl RateLimitConfig {
    pub const fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            max_requests,
            window_seconds,
        }
    }

    /// Preset for report aggregation
    pub const fn summary() -> Self {
        Self::new(30, 60)
    }

    /// Preset for provider-backed operations
    pub const fn ai() -> Self {
        Self::new(10, 60)
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds.min(MAX_WINDOW_SECONDS))
    }
}

/// Outcome of a governor check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Whole seconds until the current window resets, rounded up
    pub reset_in_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RateKey {
    identity: String,
    endpoint: String,
}

#[derive(Debug, Clone, Copy)]
struct RateWindowEntry {
    count: u32,
    reset_at: Instant,
}

/// Per-key fixed-window counter
pub struct RateGovernor {
    windows: DashMap<RateKey, RateWindowEntry>,
    last_sweep: Mutex<Instant>,
    cleanup_interval: Duration,
}

impl RateGovernor {
    pub fn new() -> Self {
        Self::with_cleanup_interval(DEFAULT_CLEANUP_INTERVAL)
    }

    pub fn with_cleanup_interval(cleanup_interval: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            last_sweep: Mutex::new(Instant::now()),
            cleanup_interval,
        }
    }

    /// Check and count one call against the current clock
    pub fn check(&self, identity: &str, endpoint: &str, config: RateLimitConfig) -> RateDecision {
        self.check_at(identity, endpoint, config, Instant::now())
    }

    /// Check and count one call at `now`
    pub fn check_at(
        &self,
        identity: &str,
        endpoint: &str,
        config: RateLimitConfig,
        now: Instant,
    ) -> RateDecision {
        // Sweep before taking a shard reference: retain locks every shard.
        self.maybe_sweep(now);

        if config.max_requests == 0 {
            return RateDecision {
                allowed: false,
                limit: 0,
                remaining: 0,
                reset_in_seconds: config.window().as_secs(),
            };
        }

        let key = RateKey {
            identity: identity.to_string(),
            endpoint: endpoint.to_string(),
        };

        let mut window = self.windows.entry(key).or_insert(RateWindowEntry {
            count: 0,
            reset_at: now,
        });

        let (allowed, remaining) = if now >= window.reset_at {
            window.count = 1;
            window.reset_at = now.checked_add(config.window()).unwrap_or(now);
            (true, config.max_requests - 1)
        } else if window.count < config.max_requests {
            window.count += 1;
            (true, config.max_requests - window.count)
        } else {
            (false, 0)
        };

        let reset_in_seconds = ceil_secs(window.reset_at.saturating_duration_since(now));

        if !allowed {
            debug!(
                identity = %identity,
                endpoint = %endpoint,
                reset_in_seconds,
                "Rate limit exceeded"
            );
        }

        RateDecision {
            allowed,
            limit: config.max_requests,
            remaining,
            reset_in_seconds,
        }
    }

    /// Remove every window that has elapsed at `now`
    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| now < window.reset_at);
        before.saturating_sub(self.windows.len())
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    fn maybe_sweep(&self, now: Instant) {
        // Another caller is already sweeping.
        let Ok(mut last) = self.last_sweep.try_lock() else {
            return;
        };
        if now.saturating_duration_since(*last) < self.cleanup_interval {
            return;
        }
        *last = now;

        let removed = self.sweep_at(now);
        if removed > 0 {
            debug!(removed, remaining = self.windows.len(), "Swept expired rate windows");
        }
    }
}

impl Default for RateGovernor {
    fn default() -> Self {
        Self::new()
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    const THREE_PER_MINUTE: RateLimitConfig = RateLimitConfig::new(3, 60);

    #[test]
    fn test_fixed_window_sequence() {
        let gov = RateGovernor::new();
        let t0 = Instant::now();

        let allowed: Vec<bool> = (0..4)
            .map(|i| {
                gov.check_at("alice", "summary", THREE_PER_MINUTE, t0 + Duration::from_secs(i))
                    .allowed
            })
            .collect();
        assert_eq!(allowed, vec![true, true, true, false]);

        let after = gov.check_at(
            "alice",
            "summary",
            THREE_PER_MINUTE,
            t0 + Duration::from_secs(61),
        );
        assert!(after.allowed);
        assert_eq!(after.remaining, 2);
    }

    #[test]
    fn test_remaining_counts_down() {
        let gov = RateGovernor::new();
        let t0 = Instant::now();
        let remaining: Vec<u32> = (0..3)
            .map(|_| gov.check_at("bob", "ai", THREE_PER_MINUTE, t0).remaining)
            .collect();
        assert_eq!(remaining, vec![2, 1, 0]);
    }

    #[test]
    fn test_denial_reports_time_to_reset() {
        let gov = RateGovernor::new();
        let t0 = Instant::now();
        for _ in 0..3 {
            gov.check_at("carol", "summary", THREE_PER_MINUTE, t0);
        }

        let denied = gov.check_at(
            "carol",
            "summary",
            THREE_PER_MINUTE,
            t0 + Duration::from_millis(20_500),
        );
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.limit, 3);
        // 39.5s left, rounded up
        assert_eq!(denied.reset_in_seconds, 40);
    }

    #[test]
    fn test_reset_reported_on_allow() {
        let gov = RateGovernor::new();
        let decision = gov.check_at("dave", "summary", THREE_PER_MINUTE, Instant::now());
        assert!(decision.allowed);
        assert_eq!(decision.reset_in_seconds, 60);
    }

    #[test]
    fn test_keys_are_independent() {
        let gov = RateGovernor::new();
        let t0 = Instant::now();
        for _ in 0..3 {
            gov.check_at("erin", "summary", THREE_PER_MINUTE, t0);
        }
        assert!(!gov.check_at("erin", "summary", THREE_PER_MINUTE, t0).allowed);
        assert!(gov.check_at("erin", "ai", THREE_PER_MINUTE, t0).allowed);
        assert!(gov.check_at("frank", "summary", THREE_PER_MINUTE, t0).allowed);
    }

    #[test]
    fn test_zero_max_denies_everything() {
        let gov = RateGovernor::new();
        let decision = gov.check("gina", "summary", RateLimitConfig::new(0, 60));
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert!(gov.is_empty());
    }

    #[test]
    fn test_oversized_window_is_clamped() {
        let gov = RateGovernor::new();
        let huge = RateLimitConfig::new(1, u64::MAX);

        let first = gov.check("hank", "summary", huge);
        assert!(first.allowed);
        assert_eq!(first.reset_in_seconds, MAX_WINDOW_SECONDS);

        let second = gov.check("hank", "summary", huge);
        assert!(!second.allowed);
        assert!(second.reset_in_seconds <= MAX_WINDOW_SECONDS);
    }

    #[test]
    fn test_lazy_sweep_removes_expired_windows() {
        let gov = RateGovernor::with_cleanup_interval(Duration::from_secs(60));
        let t0 = Instant::now();
        let short = RateLimitConfig::new(5, 10);

        gov.check_at("a", "summary", short, t0);
        gov.check_at("b", "summary", short, t0);
        assert_eq!(gov.len(), 2);

        // Windows elapsed but the cleanup interval has not.
        gov.check_at("c", "summary", short, t0 + Duration::from_secs(30));
        assert_eq!(gov.len(), 3);

        // Interval elapsed: a, b and c are all expired, d is fresh.
        gov.check_at("d", "summary", short, t0 + Duration::from_secs(61));
        assert_eq!(gov.len(), 1);
    }

    #[test]
    fn test_sweep_keeps_live_windows() {
        let gov = RateGovernor::new();
        let t0 = Instant::now();
        gov.check_at("live", "summary", RateLimitConfig::new(5, 600), t0);
        gov.check_at("dead", "summary", RateLimitConfig::new(5, 1), t0);

        assert_eq!(gov.sweep_at(t0 + Duration::from_secs(2)), 1);
        assert_eq!(gov.len(), 1);
    }

    #[test]
    fn test_concurrent_checks_never_over_admit() {
        let gov = Arc::new(RateGovernor::new());
        let admitted = Arc::new(AtomicU32::new(0));
        let config = RateLimitConfig::new(50, 60);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gov = gov.clone();
                let admitted = admitted.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        if gov.check("burst", "summary", config).allowed {
                            admitted.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(admitted.load(Ordering::SeqCst), 50);
    }
}
