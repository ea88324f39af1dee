//! Token bucket rate limiting.
//!
//! The API allows a burst of 60 requests per minute across all endpoints and
//! a separate burst of 5 cluster provisioning requests per minute. Each
//! bucket starts full and regains one token per refill interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

use crate::cancel::Cancellation;
use crate::error::RateLimitError;

pub const DEFAULT_BURST_ALLOWANCE: u32 = 60;
pub const DEFAULT_BURST_INTERVAL: Duration = Duration::from_secs(60);
pub const PROVISION_BURST_ALLOWANCE: u32 = 5;
pub const PROVISION_BURST_INTERVAL: Duration = Duration::from_secs(60);

const MIN_WAIT: Duration = Duration::from_millis(1);

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// A token bucket shared by every request that consults it.
#[derive(Debug)]
pub struct RateLimiter {
    burst: u32,
    interval: Duration,
    state: Mutex<Bucket>,
}

impl RateLimiter {
    /// Bucket of `burst` tokens, one token restored per `interval`.
    ///
    /// A zero `burst` is treated as one. A zero `interval` never throttles.
    pub fn new(burst: u32, interval: Duration) -> Self {
        let burst = burst.max(1);
        Self {
            burst,
            interval,
            state: Mutex::new(Bucket {
                tokens: f64::from(burst),
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn burst(&self) -> u32 {
        self.burst
    }

    pub fn refill_interval(&self) -> Duration {
        self.interval
    }

    /// Whole tokens available right now.
    pub async fn available(&self) -> u32 {
        let mut bucket = self.state.lock().await;
        self.refill(&mut bucket, Instant::now());
        bucket.tokens.floor() as u32
    }

    fn refill(&self, bucket: &mut Bucket, now: Instant) {
        let capacity = f64::from(self.burst);
        if self.interval.is_zero() {
            bucket.tokens = capacity;
        } else {
            let elapsed = now.saturating_duration_since(bucket.last_refill);
            let gained = elapsed.as_secs_f64() / self.interval.as_secs_f64();
            bucket.tokens = (bucket.tokens + gained).min(capacity);
        }
        bucket.last_refill = now;
    }

    /// Take one token, waiting for it if the bucket is empty.
    ///
    /// Fails without waiting when `cancel` has already fired, or when its
    /// deadline falls before the next token would arrive.
    pub async fn wait(&self, cancel: &Cancellation) -> Result<(), RateLimitError> {
        cancel.check()?;

        loop {
            let delay = {
                let mut bucket = self.state.lock().await;
                let now = Instant::now();
                self.refill(&mut bucket, now);

                // Tolerate float drift around a just-completed refill
                if bucket.tokens >= 1.0 - 1e-9 {
                    bucket.tokens = (bucket.tokens - 1.0).max(0.0);
                    return Ok(());
                }

                let deficit = 1.0 - bucket.tokens;
                self.interval.mul_f64(deficit).max(MIN_WAIT)
            };

            if let Some(deadline) = cancel.deadline()
                && Instant::now() + delay > deadline
            {
                return Err(RateLimitError::WouldExceedDeadline { wait: delay });
            }

            trace!(wait_ms = delay.as_millis() as u64, "Waiting for rate limit token");
            cancel.sleep(delay).await?;
        }
    }
}

/// The two buckets every [`Client`](crate::Client) consults.
///
/// `default` gates every request; `provision` additionally gates cluster
/// creation.
#[derive(Debug, Clone)]
pub struct ClientLimiter {
    pub default: Arc<RateLimiter>,
    pub provision: Arc<RateLimiter>,
}

impl ClientLimiter {
    pub fn new(default: RateLimiter, provision: RateLimiter) -> Self {
        Self {
            default: Arc::new(default),
            provision: Arc::new(provision),
        }
    }
}

impl Default for ClientLimiter {
    fn default() -> Self {
        Self::new(
            RateLimiter::new(DEFAULT_BURST_ALLOWANCE, DEFAULT_BURST_INTERVAL),
            RateLimiter::new(PROVISION_BURST_ALLOWANCE, PROVISION_BURST_INTERVAL),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelReason;

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_immediately_available() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        let cancel = Cancellation::new();
        let started = Instant::now();

        for _ in 0..5 {
            limiter.wait(&cancel).await.unwrap();
        }

        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(limiter.available().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refills_one_token_per_interval() {
        let limiter = RateLimiter::new(2, Duration::from_secs(10));
        let cancel = Cancellation::new();
        let started = Instant::now();

        limiter.wait(&cancel).await.unwrap();
        limiter.wait(&cancel).await.unwrap();
        limiter.wait(&cancel).await.unwrap();

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(10), "waited {elapsed:?}");
        assert!(elapsed < Duration::from_secs(11), "waited {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_exceeds_burst_per_window() {
        let burst = 3u32;
        let interval = Duration::from_secs(1);
        let limiter = Arc::new(RateLimiter::new(burst, interval));
        let started = Instant::now();

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move {
                    limiter.wait(&Cancellation::new()).await.unwrap();
                    Instant::now()
                })
            })
            .collect();

        let mut times = Vec::new();
        for handle in handles {
            times.push(handle.await.unwrap());
        }
        times.sort();

        let slack = Duration::from_millis(5);
        for (i, at) in times.iter().enumerate() {
            let i = i as u32;
            if i >= burst {
                let earliest = interval * (i - burst + 1);
                assert!(
                    at.duration_since(started) + slack >= earliest,
                    "acquisition {i} at {:?}, expected no earlier than {earliest:?}",
                    at.duration_since(started)
                );
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_wait() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let cancel = Cancellation::new();
        cancel.cancel();

        assert_eq!(limiter.wait(&cancel).await, Err(RateLimitError::Cancelled));
        // The token was not consumed
        assert_eq!(limiter.available().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_wait() {
        let limiter = Arc::new(RateLimiter::new(1, Duration::from_secs(60)));
        let cancel = Cancellation::new();
        limiter.wait(&cancel).await.unwrap();

        let waiter = {
            let limiter = Arc::clone(&limiter);
            let cancel = cancel.clone();
            tokio::spawn(async move { limiter.wait(&cancel).await })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();

        assert_eq!(waiter.await.unwrap(), Err(RateLimitError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_before_next_token_fails_fast() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        limiter.wait(&Cancellation::new()).await.unwrap();

        let cancel = Cancellation::with_timeout(Duration::from_secs(5));
        let started = Instant::now();
        let result = limiter.wait(&cancel).await;

        assert!(matches!(
            result,
            Err(RateLimitError::WouldExceedDeadline { .. })
        ));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_deadline() {
        let limiter = RateLimiter::new(1, Duration::from_secs(1));
        let cancel = Cancellation::with_timeout(Duration::ZERO);

        assert_eq!(
            limiter.wait(&cancel).await,
            Err(RateLimitError::from(CancelReason::DeadlineExceeded))
        );
    }

    #[tokio::test]
    async fn test_zero_interval_never_throttles() {
        let limiter = RateLimiter::new(1, Duration::ZERO);
        let cancel = Cancellation::new();
        for _ in 0..100 {
            limiter.wait(&cancel).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_default_limiter_pair() {
        let limiter = ClientLimiter::default();
        assert_eq!(limiter.default.burst(), DEFAULT_BURST_ALLOWANCE);
        assert_eq!(limiter.default.refill_interval(), DEFAULT_BURST_INTERVAL);
        assert_eq!(limiter.provision.burst(), PROVISION_BURST_ALLOWANCE);
        assert_eq!(limiter.provision.refill_interval(), PROVISION_BURST_INTERVAL);
    }
}
