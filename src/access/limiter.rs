//! Sliding-window rate limiter.
//!
//! One timestamp window per client address, all behind a single mutex.
//! Prune, check, and append happen in one critical section so two
//! concurrent requests from the same client cannot both slip under the
//! limit.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-client sliding-window request limiter.
#[derive(Debug)]
pub struct RateLimiter {
    windows: Mutex<HashMap<IpAddr, VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests: max_requests as usize,
            window,
        }
    }

    /// Record an admission attempt. Returns false when the client has
    /// already used its budget for the current window; denied attempts
    /// are not recorded, so hammering a limited server does not extend
    /// the lockout.
    pub fn check(&self, addr: IpAddr) -> bool {
        self.check_at(addr, Instant::now())
    }

    fn check_at(&self, addr: IpAddr, now: Instant) -> bool {
        let mut windows = self
            .windows
            .lock()
            .expect("rate limiter mutex poisoned");
        let stamps = windows.entry(addr).or_default();

        while let Some(&oldest) = stamps.front() {
            if now.duration_since(oldest) >= self.window {
                stamps.pop_front();
            } else {
                break;
            }
        }

        if stamps.len() >= self.max_requests {
            return false;
        }
        stamps.push_back(now);
        true
    }

    /// Drop clients whose entire window has expired. Admission prunes
    /// per-client on the hot path; this reclaims the map entries of
    /// clients that went away.
    pub fn sweep(&self) {
        self.sweep_at(Instant::now());
    }

    fn sweep_at(&self, now: Instant) {
        let mut windows = self
            .windows
            .lock()
            .expect("rate limiter mutex poisoned");
        windows.retain(|_, stamps| {
            stamps
                .back()
                .is_some_and(|&newest| now.duration_since(newest) < self.window)
        });
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.windows
            .lock()
            .expect("rate limiter mutex poisoned")
            .len()
    }
}
