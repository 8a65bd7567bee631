//! Reservoir rate limiter shared per upstream.
//!
//! Each upstream API gets one limiter sized to its documented quota.
//! The reservoir holds a fixed number of permits and resets to full at
//! every refill interval; callers that find it empty wait for the next
//! window rather than failing.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Permits available per window.
    pub capacity: u32,
    /// Window length after which the reservoir resets to capacity.
    pub refill_interval: Duration,
}

struct LimiterState {
    available: u32,
    window_start: Instant,
}

/// Shared reservoir limiter. Clones share the same reservoir.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    state: Arc<Mutex<LimiterState>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        let state = LimiterState {
            available: config.capacity,
            window_start: Instant::now(),
        };
        Self {
            config,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Take one permit, waiting for the next refill window if the
    /// reservoir is empty.
    ///
    /// Callers are released in arrival order: the head of the queue
    /// keeps the state locked while it waits out the window, and
    /// tokio's mutex wakes pending lockers FIFO, so nobody overtakes.
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;
        loop {
            let now = Instant::now();
            let elapsed = now.duration_since(state.window_start);
            if elapsed >= self.config.refill_interval {
                state.available = self.config.capacity;
                state.window_start = now;
            }
            if state.available > 0 {
                state.available -= 1;
                return;
            }
            trace!("Reservoir empty, waiting for refill");
            tokio::time::sleep(self.config.refill_interval - elapsed).await;
        }
    }

    /// Run `operation` once a permit is available.
    pub async fn schedule<F, T>(&self, operation: F) -> T
    where
        F: Future<Output = T>,
    {
        self.acquire().await;
        operation.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn limiter(capacity: u32, interval_ms: u64) -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            capacity,
            refill_interval: Duration::from_millis(interval_ms),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn within_capacity_permits_are_immediate() {
        let limiter = limiter(3, 1000);
        let started = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn overflow_waits_for_the_next_window() {
        let limiter = limiter(2, 1000);
        let started = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        // The third permit only exists after one full refill interval.
        assert!(started.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn queued_callers_are_released_in_arrival_order() {
        let limiter = limiter(1, 1000);
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..5 {
            let limiter = limiter.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                order.lock().unwrap().push(i);
            }));
            // Let the task reach the queue before spawning the next.
            tokio::task::yield_now().await;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_work_never_exceeds_the_window_quota() {
        let limiter = limiter(4, 1000);
        let completed = Arc::new(AtomicU32::new(0));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let limiter = limiter.clone();
                let completed = completed.clone();
                tokio::spawn(async move {
                    limiter
                        .schedule(async {
                            completed.fetch_add(1, Ordering::SeqCst);
                        })
                        .await;
                })
            })
            .collect();

        // Let the first window's permits drain without advancing past
        // the refill boundary.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(completed.load(Ordering::SeqCst), 4);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(completed.load(Ordering::SeqCst), 8);

        for handle in handles {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }
        assert_eq!(completed.load(Ordering::SeqCst), 10);
    }
}
