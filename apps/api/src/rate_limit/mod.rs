//! Sliding-window rate limiting keyed by (client identity, endpoint class).
//!
//! Each endpoint class owns one [`SlidingWindowLimiter`]: a map from identity
//! to the timestamps of its admitted requests, guarded by a single mutex.
//! Expired timestamps are dropped lazily on every check; nothing sweeps in the
//! background.

pub mod handlers;
pub mod middleware;

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;

/// Snapshot returned with every admission decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimitInfo {
    /// Requests already in the window when this one arrived.
    pub current_requests: usize,
    pub max_requests: usize,
    pub window_seconds: f64,
    pub remaining_requests: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimiterStats {
    pub total_ips: usize,
    /// Timestamps still inside the window, across all identities.
    pub total_requests: usize,
    pub max_requests_per_window: usize,
    pub window_seconds: f64,
}

/// One limit: at most `max_requests` within any trailing `window`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitRule {
    pub max_requests: usize,
    pub window: Duration,
}

impl LimitRule {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }
}

pub struct SlidingWindowLimiter {
    rule: LimitRule,
    window: chrono::Duration,
    clock: Arc<dyn Clock>,
    requests: Mutex<HashMap<String, VecDeque<DateTime<Utc>>>>,
}

impl SlidingWindowLimiter {
    pub fn new(rule: LimitRule, clock: Arc<dyn Clock>) -> Self {
        let window = chrono::Duration::from_std(rule.window)
            .unwrap_or_else(|_| chrono::Duration::days(365 * 100));
        Self {
            rule,
            window,
            clock,
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Admits the request and records it, or rejects it without touching the
    /// stored window.
    pub fn check(&self, identity: &str) -> (bool, RateLimitInfo) {
        let mut requests = self.lock();
        let now = self.clock.now();
        let cutoff = now - self.window;

        let timestamps = requests.entry(identity.to_string()).or_default();
        timestamps.retain(|t| *t > cutoff);

        let current = timestamps.len();
        let admitted = current < self.rule.max_requests;
        if admitted {
            timestamps.push_back(now);
        } else if timestamps.is_empty() {
            requests.remove(identity);
        }

        (admitted, self.info(current))
    }

    /// Time until the next request would be admitted, or `None` if it would be
    /// admitted right now.
    pub fn remaining_time(&self, identity: &str) -> Option<Duration> {
        let mut requests = self.lock();
        let now = self.clock.now();
        let cutoff = now - self.window;

        let timestamps = requests.get_mut(identity)?;
        timestamps.retain(|t| *t > cutoff);
        if timestamps.is_empty() {
            requests.remove(identity);
            return None;
        }
        if timestamps.len() < self.rule.max_requests {
            return None;
        }

        let oldest = timestamps.iter().min()?;
        Some((*oldest + self.window - now).to_std().unwrap_or(Duration::ZERO))
    }

    #[cfg(test)]
    pub fn reset(&self, identity: &str) {
        self.lock().remove(identity);
    }

    /// Compacts every identity first, so idle clients stop being counted.
    pub fn stats(&self) -> LimiterStats {
        let mut requests = self.lock();
        let cutoff = self.clock.now() - self.window;
        requests.retain(|_, timestamps| {
            timestamps.retain(|t| *t > cutoff);
            !timestamps.is_empty()
        });
        LimiterStats {
            total_ips: requests.len(),
            total_requests: requests.values().map(VecDeque::len).sum(),
            max_requests_per_window: self.rule.max_requests,
            window_seconds: self.rule.window.as_secs_f64(),
        }
    }

    fn info(&self, current: usize) -> RateLimitInfo {
        RateLimitInfo {
            current_requests: current,
            max_requests: self.rule.max_requests,
            window_seconds: self.rule.window.as_secs_f64(),
            remaining_requests: self.rule.max_requests.saturating_sub(current),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<DateTime<Utc>>>> {
        // A panic mid-update leaves at worst a stale timestamp list.
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Coarse category of API operation, each with its own limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointClass {
    Chat,
    Roles,
    General,
}

impl EndpointClass {
    #[cfg(test)]
    pub const ALL: [EndpointClass; 3] =
        [EndpointClass::Chat, EndpointClass::Roles, EndpointClass::General];

    pub fn from_path(path: &str) -> Self {
        match path {
            "/chat" => EndpointClass::Chat,
            "/roles" => EndpointClass::Roles,
            p if p.starts_with("/roles/") => EndpointClass::Roles,
            _ => EndpointClass::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointClass::Chat => "chat",
            EndpointClass::Roles => "roles",
            EndpointClass::General => "general",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimits {
    pub chat: LimitRule,
    pub roles: LimitRule,
    pub general: LimitRule,
}

impl Default for RateLimits {
    fn default() -> Self {
        let minute = Duration::from_secs(60);
        Self {
            chat: LimitRule::new(5, minute),
            roles: LimitRule::new(20, minute),
            general: LimitRule::new(30, minute),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RateLimiterStats {
    pub chat: LimiterStats,
    pub roles: LimiterStats,
    pub general: LimiterStats,
}

/// Per-endpoint-class limiters for client IPs.
pub struct IpRateLimiter {
    chat: SlidingWindowLimiter,
    roles: SlidingWindowLimiter,
    general: SlidingWindowLimiter,
}

impl IpRateLimiter {
    pub fn new(limits: RateLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            chat: SlidingWindowLimiter::new(limits.chat, clock.clone()),
            roles: SlidingWindowLimiter::new(limits.roles, clock.clone()),
            general: SlidingWindowLimiter::new(limits.general, clock),
        }
    }

    pub fn limiter(&self, class: EndpointClass) -> &SlidingWindowLimiter {
        match class {
            EndpointClass::Chat => &self.chat,
            EndpointClass::Roles => &self.roles,
            EndpointClass::General => &self.general,
        }
    }

    pub fn check(&self, identity: &str, class: EndpointClass) -> (bool, RateLimitInfo) {
        self.limiter(class).check(identity)
    }

    pub fn check_rate_limit(&self, identity: &str, path: &str) -> (bool, RateLimitInfo) {
        self.check(identity, EndpointClass::from_path(path))
    }

    pub fn remaining_time(&self, identity: &str, class: EndpointClass) -> Option<Duration> {
        self.limiter(class).remaining_time(identity)
    }

    pub fn get_remaining_time(&self, identity: &str, path: &str) -> Option<Duration> {
        self.remaining_time(identity, EndpointClass::from_path(path))
    }

    /// Clears one class for `identity`, or every class when `class` is `None`.
    #[cfg(test)]
    pub fn reset(&self, identity: &str, class: Option<EndpointClass>) {
        match class {
            Some(class) => self.limiter(class).reset(identity),
            None => EndpointClass::ALL
                .into_iter()
                .for_each(|class| self.limiter(class).reset(identity)),
        }
    }

    pub fn get_stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            chat: self.chat.stats(),
            roles: self.roles.stats(),
            general: self.general.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, SystemClock};

    fn limiter(max: usize, window_secs: u64) -> (SlidingWindowLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let limiter = SlidingWindowLimiter::new(
            LimitRule::new(max, Duration::from_secs(window_secs)),
            clock.clone(),
        );
        (limiter, clock)
    }

    #[test]
    fn test_window_admits_max_then_rejects() {
        let (limiter, clock) = limiter(3, 2);
        let ip = "127.0.0.1";

        assert!(limiter.check(ip).0);
        assert!(limiter.check(ip).0);
        assert!(limiter.check(ip).0);

        let (allowed, info) = limiter.check(ip);
        assert!(!allowed);
        assert_eq!(info.remaining_requests, 0);
        assert_eq!(info.current_requests, 3);
        assert_eq!(info.max_requests, 3);

        clock.advance(chrono::Duration::milliseconds(2100));
        assert!(limiter.check(ip).0);
    }

    #[test]
    fn test_window_with_real_clock() {
        let limiter = SlidingWindowLimiter::new(
            LimitRule::new(2, Duration::from_millis(200)),
            Arc::new(SystemClock),
        );
        assert!(limiter.check("a").0);
        assert!(limiter.check("a").0);
        assert!(!limiter.check("a").0);
        std::thread::sleep(Duration::from_millis(250));
        assert!(limiter.check("a").0);
    }

    #[test]
    fn test_info_reports_count_before_admission() {
        let (limiter, _) = limiter(3, 2);
        let (_, first) = limiter.check("ip");
        assert_eq!(first.current_requests, 0);
        assert_eq!(first.remaining_requests, 3);
        assert_eq!(first.window_seconds, 2.0);

        let (_, second) = limiter.check("ip");
        assert_eq!(second.current_requests, 1);
        assert_eq!(second.remaining_requests, 2);

        limiter.check("ip");
        let (allowed, rejected) = limiter.check("ip");
        assert!(!allowed);
        assert_eq!(rejected.current_requests, 3);
        assert_eq!(rejected.remaining_requests, 0);
    }

    #[test]
    fn test_rejection_does_not_record() {
        let (limiter, clock) = limiter(1, 10);
        assert!(limiter.check("ip").0);
        clock.advance(chrono::Duration::seconds(5));
        assert!(!limiter.check("ip").0);
        // Only the admitted request ages out; the rejected one was never stored.
        clock.advance(chrono::Duration::seconds(6));
        assert!(limiter.check("ip").0);
    }

    #[test]
    fn test_window_slides_per_timestamp() {
        let (limiter, clock) = limiter(2, 10);
        assert!(limiter.check("ip").0);
        clock.advance(chrono::Duration::seconds(6));
        assert!(limiter.check("ip").0);
        assert!(!limiter.check("ip").0);
        // First request leaves the window, second is still inside.
        clock.advance(chrono::Duration::seconds(5));
        assert!(limiter.check("ip").0);
        assert!(!limiter.check("ip").0);
    }

    #[test]
    fn test_timestamp_exactly_at_cutoff_is_expired() {
        let (limiter, clock) = limiter(1, 10);
        assert!(limiter.check("ip").0);
        clock.advance(chrono::Duration::seconds(10));
        assert!(limiter.check("ip").0);
    }

    #[test]
    fn test_identities_are_independent() {
        let (limiter, _) = limiter(1, 60);
        assert!(limiter.check("a").0);
        assert!(!limiter.check("a").0);
        assert!(limiter.check("b").0);
    }

    #[test]
    fn test_reset_readmits_exhausted_identity() {
        let (limiter, _) = limiter(2, 10);
        let ip = "192.168.0.1";
        assert!(limiter.check(ip).0);
        assert!(limiter.check(ip).0);
        assert!(!limiter.check(ip).0);
        limiter.reset(ip);
        assert!(limiter.check(ip).0);
    }

    #[test]
    fn test_remaining_time_none_when_admissible() {
        let (limiter, _) = limiter(2, 10);
        assert_eq!(limiter.remaining_time("ip"), None);
        limiter.check("ip");
        assert_eq!(limiter.remaining_time("ip"), None);
    }

    #[test]
    fn test_remaining_time_counts_down_from_oldest() {
        let (limiter, clock) = limiter(2, 10);
        limiter.check("ip");
        clock.advance(chrono::Duration::seconds(3));
        limiter.check("ip");
        clock.advance(chrono::Duration::seconds(1));
        // Oldest was 4s ago in a 10s window.
        assert_eq!(limiter.remaining_time("ip"), Some(Duration::from_secs(6)));
    }

    #[test]
    fn test_stats_track_identities_and_requests() {
        let (limiter, _) = limiter(5, 60);
        limiter.check("a");
        limiter.check("a");
        limiter.check("b");
        let stats = limiter.stats();
        assert_eq!(stats.total_ips, 2);
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.max_requests_per_window, 5);
    }

    #[test]
    fn test_idle_identities_are_dropped() {
        let (limiter, clock) = limiter(3, 2);
        for i in 0..1002 {
            limiter.check(&format!("10.0.{}.{}", i / 256, i % 256));
        }
        assert_eq!(limiter.stats().total_ips, 1002);

        clock.advance(chrono::Duration::seconds(10));
        let stats = limiter.stats();
        assert_eq!(stats.total_ips, 0);
        assert_eq!(stats.total_requests, 0);
    }

    #[test]
    fn test_remaining_time_drops_expired_identity() {
        let (limiter, clock) = limiter(1, 2);
        limiter.check("ip");
        clock.advance(chrono::Duration::seconds(3));
        assert_eq!(limiter.remaining_time("ip"), None);
        assert!(limiter.lock().is_empty());
    }

    #[test]
    fn test_zero_limit_rejects_without_growing_map() {
        let (limiter, _) = limiter(0, 60);
        assert!(!limiter.check("ip").0);
        assert_eq!(limiter.stats().total_ips, 0);
    }

    #[test]
    fn test_endpoint_classification() {
        assert_eq!(EndpointClass::from_path("/chat"), EndpointClass::Chat);
        assert_eq!(EndpointClass::from_path("/roles"), EndpointClass::Roles);
        assert_eq!(
            EndpointClass::from_path("/roles/recruiter/examples"),
            EndpointClass::Roles
        );
        assert_eq!(EndpointClass::from_path("/rolesx"), EndpointClass::General);
        assert_eq!(EndpointClass::from_path("/chat/extra"), EndpointClass::General);
        assert_eq!(EndpointClass::from_path("/health"), EndpointClass::General);
    }

    #[test]
    fn test_ip_limiter_applies_per_class_limits() {
        let limiter = IpRateLimiter::new(RateLimits::default(), Arc::new(ManualClock::new()));
        let ip = "10.0.0.1";

        for _ in 0..5 {
            assert!(limiter.check_rate_limit(ip, "/chat").0);
        }
        assert!(!limiter.check_rate_limit(ip, "/chat").0);
        limiter.reset(ip, Some(EndpointClass::Chat));
        assert!(limiter.check_rate_limit(ip, "/chat").0);

        for _ in 0..20 {
            assert!(limiter.check_rate_limit(ip, "/roles").0);
        }
        assert!(!limiter.check_rate_limit(ip, "/roles").0);
        limiter.reset(ip, Some(EndpointClass::Roles));
        assert!(limiter.check_rate_limit(ip, "/roles").0);

        for _ in 0..30 {
            assert!(limiter.check_rate_limit(ip, "/other").0);
        }
        assert!(!limiter.check_rate_limit(ip, "/other").0);

        limiter.reset(ip, None);
        assert!(limiter.check_rate_limit(ip, "/chat").0);
        assert!(limiter.check_rate_limit(ip, "/roles").0);
        assert!(limiter.check_rate_limit(ip, "/other").0);
    }

    #[test]
    fn test_classes_do_not_share_windows() {
        let limiter = IpRateLimiter::new(RateLimits::default(), Arc::new(ManualClock::new()));
        for _ in 0..5 {
            limiter.check("ip", EndpointClass::Chat);
        }
        assert!(!limiter.check("ip", EndpointClass::Chat).0);
        assert!(limiter.check("ip", EndpointClass::General).0);
        assert!(limiter.get_remaining_time("ip", "/chat").is_some());
        assert!(limiter.get_remaining_time("ip", "/health").is_none());
    }

    #[test]
    fn test_concurrent_checks_never_exceed_limit() {
        let limiter = Arc::new(SlidingWindowLimiter::new(
            LimitRule::new(50, Duration::from_secs(60)),
            Arc::new(ManualClock::new()),
        ));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    (0..20).filter(|_| limiter.check("shared").0).count()
                })
            })
            .collect();
        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 50);
    }
}
