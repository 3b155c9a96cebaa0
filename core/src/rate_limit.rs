use crate::time::DateTime;
use crate::{Context, Error, Result};
use async_trait::async_trait;
use log::debug;
use std::fmt::Debug;
use std::sync::Mutex;
use std::time::Duration;

/// RateLimit throttles the call rate of outgoing requests.
///
/// It's independent from throttle retry: the executor acquires it before
/// every send attempt, retries included.
#[async_trait]
pub trait RateLimit: Debug + Send + Sync + 'static {
    /// Wait until the next request is allowed to go out.
    ///
    /// There is no cancellation other than dropping the returned future.
    async fn acquire(&self, ctx: &Context);
}

/// NoopRateLimit never delays anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRateLimit;

#[async_trait]
impl RateLimit for NoopRateLimit {
    async fn acquire(&self, _: &Context) {}
}

/// RateLimiter enforces a call-rate ceiling by spacing requests evenly.
///
/// Every acquirer reserves the next free slot and sleeps until it arrives, so
/// concurrent callers are served in the order they reserved.
#[derive(Debug)]
pub struct RateLimiter {
    interval: chrono::TimeDelta,
    next_slot: Mutex<Option<DateTime>>,
}

impl RateLimiter {
    /// Allow at most `permits_per_second` requests per second.
    pub fn new(permits_per_second: f64) -> Result<Self> {
        if !permits_per_second.is_finite() || permits_per_second <= 0.0 {
            return Err(Error::config_invalid(format!(
                "rate limit must be a positive number of permits per second, got {permits_per_second}"
            )));
        }

        Self::with_interval(Duration::from_secs_f64(1.0 / permits_per_second))
    }

    /// Require at least `interval` between two requests.
    pub fn with_interval(interval: Duration) -> Result<Self> {
        let interval = chrono::TimeDelta::from_std(interval).map_err(|e| {
            Error::config_invalid("rate limit interval is out of range").with_source(e)
        })?;

        Ok(Self {
            interval,
            next_slot: Mutex::new(None),
        })
    }

    /// Reserve the next slot, returning how long the caller has to wait for it.
    fn reserve(&self, now: DateTime) -> Duration {
        let mut next = self.next_slot.lock().expect("lock poisoned");
        let slot = match *next {
            Some(at) if at > now => at,
            _ => now,
        };
        *next = Some(slot + self.interval);

        (slot - now).to_std().unwrap_or_default()
    }
}

#[async_trait]
impl RateLimit for RateLimiter {
    async fn acquire(&self, ctx: &Context) {
        let wait = self.reserve(ctx.now());
        if !wait.is_zero() {
            debug!("rate limiter delays request for {wait:?}");
            ctx.sleep(wait).await;
        }
    }
}
