use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::config::get_config;
use crate::errors::AppError;

#[derive(Clone, Debug)]
struct Window {
    count: u32,
    started_at: DateTime<Utc>,
}

/// Fixed-window counter per caller.
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
    max_requests: u32,
    window_seconds: i64,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_seconds: i64) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests,
            window_seconds,
        }
    }

    /// Count one request from `caller` and refuse it once the window is full.
    pub fn check(&self, caller: &str) -> Result<(), AppError> {
        self.check_at(caller, Utc::now())
    }

    fn check_at(&self, caller: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| AppError::Internal("rate limiter lock poisoned".into()))?;

        let length = Duration::seconds(self.window_seconds);
        windows.retain(|_, w| now < w.started_at + length);

        let window = windows.entry(caller.to_string()).or_insert(Window {
            count: 0,
            started_at: now,
        });

        window.count += 1;
        if window.count > self.max_requests {
            let retry_after = (window.started_at + length - now).num_seconds().max(0);
            return Err(AppError::RateLimited(format!(
                "Too many coupon attempts. Try again in {} seconds.",
                retry_after
            )));
        }

        Ok(())
    }
}

lazy_static::lazy_static! {
    /// Coupon lookups at checkout, per customer.
    pub static ref CHECKOUT_COUPON_LIMIT: RateLimiter = {
        let security = &get_config().security;
        RateLimiter::new(security.checkout_attempts, security.checkout_window_secs)
    };
}
