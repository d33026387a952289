//! Fixed-window request limiter for oracle calls.

use std::sync::Mutex;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct Window {
    started: Instant,
    used: u32,
}

/// Allows at most `limit` requests per minute window.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Mutex<Window>,
}

impl RateLimiter {
    pub fn per_minute(limit: u32) -> Self {
        Self {
            limit,
            window: Mutex::new(Window {
                started: Instant::now(),
                used: 0,
            }),
        }
    }

    /// Take a slot if one is free. Returns the wait until the window resets otherwise.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> Result<(), Duration> {
        let mut window = self
            .window
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let elapsed = now.saturating_duration_since(window.started);
        if elapsed >= WINDOW {
            window.started = now;
            window.used = 0;
        }

        if window.used >= self.limit {
            return Err(WINDOW.saturating_sub(elapsed));
        }
        window.used += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_past_limit_within_window() {
        let limiter = RateLimiter::per_minute(2);
        let t0 = Instant::now();
        assert!(limiter.try_acquire_at(t0).is_ok());
        assert!(limiter.try_acquire_at(t0).is_ok());
        let wait = limiter.try_acquire_at(t0 + Duration::from_secs(10)).unwrap_err();
        assert!(wait <= Duration::from_secs(50));
        assert!(wait > Duration::from_secs(49));
    }

    #[test]
    fn window_resets_after_a_minute() {
        let limiter = RateLimiter::per_minute(1);
        let t0 = Instant::now();
        assert!(limiter.try_acquire_at(t0).is_ok());
        assert!(limiter.try_acquire_at(t0).is_err());
        assert!(limiter.try_acquire_at(t0 + WINDOW).is_ok());
    }
}
