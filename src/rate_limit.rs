//! Fixed-window attempt limiter for sensitive operations (login, password change).
//!
//! State is process-local: it is lost on restart and not shared between instances.

use std::{
    collections::HashMap,
    net::IpAddr,
    sync::Mutex,
    time::{Duration, Instant},
};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttemptKey {
    pub ip: Option<IpAddr>,
    pub subject: String,
}

impl AttemptKey {
    pub fn new(ip: Option<IpAddr>, subject: impl Into<String>) -> Self {
        Self {
            ip,
            subject: subject.into().to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    attempts: u32,
}

#[derive(Debug)]
pub struct AttemptLimiter {
    max_attempts: u32,
    window: Duration,
    entries: Mutex<HashMap<AttemptKey, Window>>,
}

impl AttemptLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Count one attempt for `key`; errors with the remaining window once the
    /// budget is spent.
    pub fn hit(&self, key: &AttemptKey) -> AppResult<()> {
        self.hit_at(key, Instant::now())
    }

    /// Forget a key, typically after a successful attempt.
    pub fn reset(&self, key: &AttemptKey) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }

    fn hit_at(&self, key: &AttemptKey, now: Instant) -> AppResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("rate limiter poisoned")))?;

        // drop expired windows so the map does not grow without bound
        entries.retain(|_, w| now.duration_since(w.started) < self.window);

        let window = entries.entry(key.clone()).or_insert(Window {
            started: now,
            attempts: 0,
        });

        if window.attempts >= self.max_attempts {
            let elapsed = now.duration_since(window.started);
            let remaining = self.window.saturating_sub(elapsed);
            return Err(AppError::TooManyRequests {
                retry_after_secs: remaining.as_secs().max(1),
            });
        }

        window.attempts += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(subject: &str) -> AttemptKey {
        AttemptKey::new(Some("10.0.0.1".parse().unwrap()), subject)
    }

    #[test]
    fn blocks_after_budget_is_spent() {
        let limiter = AttemptLimiter::new(2, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.hit_at(&key("a@example.com"), now).is_ok());
        assert!(limiter.hit_at(&key("a@example.com"), now).is_ok());

        match limiter.hit_at(&key("a@example.com"), now + Duration::from_secs(10)) {
            Err(AppError::TooManyRequests { retry_after_secs }) => {
                assert_eq!(retry_after_secs, 50)
            }
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[test]
    fn keys_are_independent_and_case_insensitive() {
        let limiter = AttemptLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.hit_at(&key("A@example.com"), now).is_ok());
        assert!(limiter.hit_at(&key("a@example.com"), now).is_err());
        assert!(limiter.hit_at(&key("b@example.com"), now).is_ok());

        let other_ip = AttemptKey::new(Some("10.0.0.2".parse().unwrap()), "a@example.com");
        assert!(limiter.hit_at(&other_ip, now).is_ok());
    }

    #[test]
    fn window_expiry_and_reset_restore_budget() {
        let limiter = AttemptLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        let k = key("c@example.com");
        assert!(limiter.hit_at(&k, now).is_ok());
        assert!(limiter.hit_at(&k, now).is_err());
        assert!(limiter.hit_at(&k, now + Duration::from_secs(61)).is_ok());

        limiter.reset(&k);
        assert!(limiter.hit_at(&k, now + Duration::from_secs(62)).is_ok());
    }
}
