//! Sliding-window rate limiter

use super::ConfigError;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Allows at most `max_calls` acquisitions in any trailing `window`
///
/// Keeps the timestamps of recent calls. Before each call, entries older than
/// the window are pruned; if the record is still full the caller sleeps until
/// the oldest entry leaves the window.
#[derive(Debug)]
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter allowing `max_calls` per `window`
    pub fn new(max_calls: u32, window: Duration) -> Result<Self, ConfigError> {
        if max_calls == 0 || window.is_zero() {
            return Err(ConfigError::InvalidRateLimit {
                max_calls,
                window_ms: window.as_millis(),
            });
        }

        Ok(Self {
            max_calls: max_calls as usize,
            window,
            calls: Mutex::new(VecDeque::with_capacity(max_calls as usize)),
        })
    }

    /// Maximum calls per window
    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    /// Window length
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait until a call is permitted, then record it
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut calls = self.calls.lock().await;
                let now = Instant::now();

                while let Some(oldest) = calls.front() {
                    if now.duration_since(*oldest) >= self.window {
                        calls.pop_front();
                    } else {
                        break;
                    }
                }

                if calls.len() < self.max_calls {
                    calls.push_back(now);
                    return;
                }

                self.window - now.duration_since(calls[0])
            };

            tracing::trace!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting");
            sleep(wait).await;
        }
    }
}
