//! # Rate Limiting Feature
//!
//! Sliding-window limit on AI replies per owner. Commands and reminder
//! flows are never limited.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Keyed by owner only; uses the tokio clock so paused tests can advance it
//! - 1.0.0: Initial release with per-user sliding window rate limiting

use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

pub struct RateLimiter {
    requests: DashMap<String, Vec<Instant>>,
    max_requests: usize,
    time_window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, time_window: Duration) -> Self {
        RateLimiter {
            requests: DashMap::new(),
            max_requests,
            time_window,
        }
    }

    /// Record a request for `owner_id` if the window has room
    pub fn check(&self, owner_id: &str) -> bool {
        let now = Instant::now();
        let mut entry = self.requests.entry(owner_id.to_string()).or_default();

        entry.retain(|&time| now.duration_since(time) < self.time_window);

        if entry.len() >= self.max_requests {
            false
        } else {
            entry.push(now);
            true
        }
    }

    /// Time until the oldest request in the window expires
    pub fn retry_after(&self, owner_id: &str) -> Option<Duration> {
        let entry = self.requests.get(owner_id)?;
        if entry.len() < self.max_requests {
            return None;
        }
        let oldest = *entry.first()?;
        self.time_window.checked_sub(oldest.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_allows_under_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1));

        assert!(limiter.check("user1"));
        assert!(limiter.check("user1"));
        assert!(limiter.check("user1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_blocks_over_limit() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1));

        assert!(limiter.check("user1"));
        assert!(limiter.check("user1"));
        assert!(!limiter.check("user1"));
        assert!(limiter.retry_after("user1").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_resets_after_window() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.check("user1"));
        assert!(!limiter.check("user1"));

        advance(Duration::from_secs(45)).await;
        assert_eq!(limiter.retry_after("user1"), Some(Duration::from_secs(15)));

        advance(Duration::from_secs(16)).await;
        assert!(limiter.check("user1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_per_user() {
        let limiter = RateLimiter::new(1, Duration::from_secs(1));

        assert!(limiter.check("user1"));
        assert!(limiter.check("user2"));
        assert!(!limiter.check("user1"));
        assert!(!limiter.check("user2"));
        assert_eq!(limiter.retry_after("user3"), None);
    }
}
