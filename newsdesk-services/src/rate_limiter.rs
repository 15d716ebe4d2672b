//! Shared rate limiter for provider calls
//!
//! Enforces a minimum inter-request delay plus a rolling-window budget per
//! provider, shared across every strategy that talks to that provider.
//!
//! ## Key Design: Reservation-Based Scheduling
//!
//! When multiple tasks call `acquire()` concurrently, each task "reserves"
//! a future time slot BEFORE releasing the lock. This prevents the race
//! condition where multiple tasks see the same timestamp and all decide
//! to wait the same amount of time.

use std::{
    collections::VecDeque,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Reserved slot times, in milliseconds since the limiter's epoch
#[derive(Debug)]
struct SlotState {
    /// When the next request can be made under the minimum interval
    next_available_ms: u64,
    /// Slot times still inside the rolling window
    recent: VecDeque<u64>,
}

/// Rate limiter combining minimum spacing with a rolling-window ceiling
///
/// The minimum interval keeps requests SPACED OUT over time, preventing
/// burst patterns that trigger server-side limits; the window ceiling caps
/// how many calls land in any trailing window (e.g., 5 per 60s), which the
/// interval alone cannot guarantee after idle periods.
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<SlotState>,
    /// The epoch instant (when this limiter was created)
    epoch: Instant,
    /// Minimum interval between requests
    min_interval: Duration,
    /// Rolling window length
    window: Duration,
    /// Maximum calls allowed inside one window
    max_in_window: usize,
    /// Name for logging purposes
    name: String,
    /// Total requests processed; this is the provider's request log
    total_requests: AtomicU64,
    /// Requests that had to wait for a slot
    waited_requests: AtomicU64,
}

impl RateLimiter {
    /// Create a limiter with only a minimum inter-request interval
    pub fn new(min_interval_ms: u64, name: &str) -> Self {
        Self {
            state: Mutex::new(SlotState {
                next_available_ms: 0,
                recent: VecDeque::new(),
            }),
            epoch: Instant::now(),
            min_interval: Duration::from_millis(min_interval_ms),
            window: Duration::from_secs(60),
            max_in_window: usize::MAX,
            name: name.to_string(),
            total_requests: AtomicU64::new(0),
            waited_requests: AtomicU64::new(0),
        }
    }

    /// Add a rolling-window budget: at most `max_calls` per `window`
    pub fn with_budget(mut self, window: Duration, max_calls: usize) -> Self {
        self.window = window;
        self.max_in_window = max_calls.max(1);
        self
    }

    fn instant_to_ms(&self, instant: Instant) -> u64 {
        instant.duration_since(self.epoch).as_millis() as u64
    }

    fn ms_to_instant(&self, ms: u64) -> Instant {
        self.epoch + Duration::from_millis(ms)
    }

    /// Acquire permission to make a request, waiting if necessary
    ///
    /// Reserves the earliest slot satisfying both the minimum interval and
    /// the window budget while holding the lock, then sleeps outside it.
    /// Each concurrent caller therefore gets a DIFFERENT slot and no call
    /// is ever dropped, only delayed.
    pub async fn acquire(&self) {
        let request_num = self.total_requests.fetch_add(1, Ordering::Relaxed) + 1;
        let now_ms = self.instant_to_ms(Instant::now());
        let window_ms = self.window.as_millis() as u64;

        let slot = {
            let mut state = self.state.lock().await;

            let mut slot = now_ms.max(state.next_available_ms);

            // Drop slots that have already left the trailing window
            while let Some(&front) = state.recent.front() {
                if front + window_ms <= slot {
                    state.recent.pop_front();
                } else {
                    break;
                }
            }

            // Window full: wait until the oldest blocking slot falls out
            if state.recent.len() >= self.max_in_window {
                let blocking = state.recent[state.recent.len() - self.max_in_window];
                slot = slot.max(blocking + window_ms);
                while let Some(&front) = state.recent.front() {
                    if front + window_ms <= slot {
                        state.recent.pop_front();
                    } else {
                        break;
                    }
                }
            }

            state.recent.push_back(slot);
            state.next_available_ms = slot + self.min_interval.as_millis() as u64;
            slot
        };

        if slot > now_ms {
            self.waited_requests.fetch_add(1, Ordering::Relaxed);
            let wait = self
                .ms_to_instant(slot)
                .saturating_duration_since(Instant::now());
            debug!(
                "[RATE_LIMITER:{}] #{} queued, sleeping {:?}",
                self.name, request_num, wait
            );
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
        } else {
            debug!("[RATE_LIMITER:{}] #{} immediate", self.name, request_num);
        }
    }

    /// Check if a request could be made right now without waiting
    pub async fn can_acquire_immediately(&self) -> bool {
        let now_ms = self.instant_to_ms(Instant::now());
        let window_ms = self.window.as_millis() as u64;
        let state = self.state.lock().await;

        if now_ms < state.next_available_ms {
            return false;
        }
        let in_window = state
            .recent
            .iter()
            .filter(|&&slot| slot + window_ms > now_ms)
            .count();
        in_window < self.max_in_window
    }

    /// Minimum interval between requests
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Snapshot of the request log
    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            waited_requests: self.waited_requests.load(Ordering::Relaxed),
            min_interval_ms: self.min_interval.as_millis() as u64,
            max_in_window: self.max_in_window,
            name: self.name.clone(),
        }
    }
}

/// Statistics about rate limiter usage
#[derive(Debug, Clone)]
pub struct RateLimiterStats {
    pub total_requests: u64,
    pub waited_requests: u64,
    pub min_interval_ms: u64,
    pub max_in_window: usize,
    pub name: String,
}
