//! Sliding window log rate limiter shared by every fetch in the process.
//!
//! Records the instant of each granted request. A request is granted only
//! if fewer than `max_requests` grants fall inside the trailing window, so
//! the remote never sees more than `max_requests` calls in any window-length
//! interval.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use tokio::time::Instant;

/// Default budget: 15 requests per 60 seconds.
const DEFAULT_MAX_REQUESTS: u32 = 15;

/// Default window length.
const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Request budget: at most `max_requests` grants per `window`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateBudget {
    /// Maximum grants inside any window. Must be non-zero.
    pub max_requests: u32,
    /// Length of the sliding window. Must be non-zero.
    pub window: Duration,
}

impl RateBudget {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }
}

impl Default for RateBudget {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

/// Sliding window log rate limiter.
///
/// Thread-safe; share it behind an `Arc`. The lock is never held across an
/// await point: waiters compute their delay under the lock, release it,
/// sleep, and then re-check from scratch.
pub struct RateLimiter {
    budget: RateBudget,
    /// Instants of grants still inside the window, oldest first.
    grants: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(budget: RateBudget) -> Self {
        Self {
            budget,
            grants: Mutex::new(VecDeque::with_capacity(budget.max_requests as usize)),
        }
    }

    pub fn budget(&self) -> RateBudget {
        self.budget
    }

    /// Lock the grant log, recovering from poison if necessary.
    ///
    /// The log holds only instants, so a panic elsewhere cannot leave it in
    /// a state that breaks the window check.
    fn lock_grants(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        self.grants.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter grant log mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Drop grants that have left the window ending at `now`.
    fn prune(&self, grants: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = grants.front() {
            if now.saturating_duration_since(oldest) >= self.budget.window {
                grants.pop_front();
            } else {
                break;
            }
        }
    }

    /// Grant and record a request at `now` if the window has room, otherwise
    /// return how long until the oldest grant leaves the window.
    fn try_grant(&self, now: Instant) -> Result<(), Duration> {
        let mut grants = self.lock_grants();
        self.prune(&mut grants, now);

        if grants.len() < self.budget.max_requests as usize {
            grants.push_back(now);
            return Ok(());
        }

        let wait = match grants.front() {
            Some(&oldest) => (oldest + self.budget.window).saturating_duration_since(now),
            None => self.budget.window,
        };
        Err(wait)
    }

    /// Wait until a request may be sent, then record it.
    ///
    /// Cancellation-safe: dropping the future while it sleeps records
    /// nothing.
    pub async fn acquire(&self) {
        loop {
            match self.try_grant(Instant::now()) {
                Ok(()) => {
                    debug!("Rate limiter: granted request");
                    return;
                }
                Err(wait) => {
                    debug!("Rate limiter: window full, waiting {:?}", wait);
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Grant a request only if one is available right now.
    pub fn try_acquire(&self) -> bool {
        self.try_grant(Instant::now()).is_ok()
    }

    /// Number of grants currently inside the window.
    pub fn in_flight_window(&self) -> usize {
        let mut grants = self.lock_grants();
        self.prune(&mut grants, Instant::now());
        grants.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateBudget::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_default_budget() {
        let budget = RateBudget::default();
        assert_eq!(budget.max_requests, 15);
        assert_eq!(budget.window, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_acquire_exhausts_budget() {
        let limiter = RateLimiter::new(RateBudget::new(3, Duration::from_secs(10)));

        for _ in 0..3 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());
        assert_eq!(limiter.in_flight_window(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_grants_expire_after_window() {
        let limiter = RateLimiter::new(RateBudget::new(2, Duration::from_secs(10)));

        assert!(limiter.try_acquire());
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());

        // First grant leaves the window at t=10, second at t=14
        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(limiter.in_flight_window(), 1);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_waits_for_oldest_grant() {
        let limiter = RateLimiter::new(RateBudget::default());
        let start = Instant::now();

        for _ in 0..15 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);

        limiter.acquire().await;
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(60));
        assert!(waited < Duration::from_secs(61));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_invariant_under_concurrent_acquire() {
        let budget = RateBudget::new(5, Duration::from_secs(10));
        let limiter = Arc::new(RateLimiter::new(budget));
        let granted = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for _ in 0..23 {
            let limiter = limiter.clone();
            let granted = granted.clone();
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                granted.lock().unwrap().push(Instant::now());
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut granted = granted.lock().unwrap().clone();
        granted.sort();
        assert_eq!(granted.len(), 23);

        // Any max_requests + 1 consecutive grants must span at least a window
        let n = budget.max_requests as usize;
        for i in 0..granted.len() - n {
            let span = granted[i + n].duration_since(granted[i]);
            assert!(
                span >= budget.window,
                "grants {} and {} only {:?} apart",
                i,
                i + n,
                span
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_acquire_records_nothing() {
        let limiter = RateLimiter::new(RateBudget::new(1, Duration::from_secs(10)));
        limiter.acquire().await;

        let timed_out =
            tokio::time::timeout(Duration::from_secs(1), limiter.acquire()).await;
        assert!(timed_out.is_err());
        assert_eq!(limiter.in_flight_window(), 1);
    }
}
