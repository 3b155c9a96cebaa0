//! Request execution with rate limiting and throttle retry.
//!
//! Every attempt walks `BUILD -> SIGN -> SEND` and then classifies the
//! response:
//!
//! - `2xx`: returned to the caller.
//! - `429`: the `Retry-After` header decides when to try again. If that
//!   instant lies beyond the caller's deadline, the executor gives up with
//!   [`ErrorKind::Throttled`](crate::ErrorKind::Throttled) without waiting.
//!   Otherwise it waits and starts over from `BUILD`.
//! - anything else: [`ErrorKind::HttpStatus`](crate::ErrorKind::HttpStatus).
//!
//! Transport failures are wrapped into
//! [`ErrorKind::Transport`](crate::ErrorKind::Transport) and never retried.

use crate::rate_limit::{NoopRateLimit, RateLimit};
use crate::time::{format_http_date, parse_http_date, DateTime};
use crate::{Error, RequestDescriptor, Result, Signer, SigningCredential};
use bytes::Bytes;
use http::header::RETRY_AFTER;
use http::StatusCode;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Parse a `Retry-After` value into the absolute instant to resume at.
///
/// Accepts delay-seconds (`120`) and HTTP-dates. Dates in the past resume
/// immediately. Returns `None` for anything else.
pub fn parse_retry_after(value: &str, now: DateTime) -> Option<DateTime> {
    let value = value.trim();

    if let Ok(secs) = value.parse::<u64>() {
        let secs = i64::try_from(secs).ok()?;
        return now.checked_add_signed(chrono::TimeDelta::try_seconds(secs)?);
    }

    parse_http_date(value).ok().map(|at| at.max(now))
}

/// A server announced pause of one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Throttle {
    /// Instant the resource may be called again.
    pub resume_at: DateTime,
    /// Raw `Retry-After` value that announced the pause.
    pub retry_after: Option<String>,
}

/// ThrottleRegistry remembers when throttled resources may be called again.
///
/// Entries are keyed by [`RequestDescriptor::resource_key`] and owned by one
/// executor, so separate executors (and tests) never share state.
#[derive(Debug, Default)]
pub struct ThrottleRegistry {
    entries: Mutex<HashMap<String, Throttle>>,
}

impl ThrottleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `key` must not be called before `resume_at`.
    ///
    /// An earlier record is only replaced by a later instant.
    pub fn record(&self, key: &str, resume_at: DateTime, retry_after: Option<String>) {
        let mut entries = self.entries.lock().expect("lock poisoned");
        match entries.get_mut(key) {
            Some(entry) if entry.resume_at >= resume_at => {}
            Some(entry) => {
                entry.resume_at = resume_at;
                entry.retry_after = retry_after;
            }
            None => {
                entries.insert(
                    key.to_string(),
                    Throttle {
                        resume_at,
                        retry_after,
                    },
                );
            }
        }
    }

    /// Get the pause of `key` that is still running at `now`.
    ///
    /// Pauses that already ended are dropped.
    pub fn pending(&self, key: &str, now: DateTime) -> Option<Throttle> {
        let mut entries = self.entries.lock().expect("lock poisoned");
        match entries.get(key) {
            Some(entry) if entry.resume_at > now => Some(entry.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Forget the throttle record of `key`.
    pub fn clear(&self, key: &str) {
        self.entries.lock().expect("lock poisoned").remove(key);
    }

    /// Number of throttled resources.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("lock poisoned").len()
    }

    /// Check if nothing is throttled.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Executor sends authenticated requests.
///
/// ```no_run
/// # async fn example<K: reqexec_core::SigningCredential>(
/// #     executor: reqexec_core::Executor<K>,
/// # ) -> reqexec_core::Result<()> {
/// use reqexec_core::RequestDescriptor;
/// use std::time::Duration;
///
/// let resp = executor
///     .execute_within(
///         || RequestDescriptor::new(http::Method::GET, "https://account.blob.core.windows.net/c/b"),
///         Duration::from_secs(30),
///     )
///     .await?;
/// println!("status: {}", resp.status());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Executor<K: SigningCredential> {
    signer: Signer<K>,
    rate_limit: Arc<dyn RateLimit>,
    throttles: Arc<ThrottleRegistry>,
}

impl<K: SigningCredential> Executor<K> {
    /// Create an executor that signs with `signer` and sends through the
    /// signer's context.
    pub fn new(signer: Signer<K>) -> Self {
        Self {
            signer,
            rate_limit: Arc::new(NoopRateLimit),
            throttles: Arc::new(ThrottleRegistry::new()),
        }
    }

    /// Use the given rate limiter.
    pub fn with_rate_limit(mut self, rate_limit: impl RateLimit) -> Self {
        self.rate_limit = Arc::new(rate_limit);
        self
    }

    /// Use a rate limiter shared with other executors.
    pub fn with_shared_rate_limit(mut self, rate_limit: Arc<dyn RateLimit>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Get the signer of this executor.
    pub fn signer(&self) -> &Signer<K> {
        &self.signer
    }

    /// Get the throttle registry of this executor.
    pub fn throttle_registry(&self) -> &ThrottleRegistry {
        &self.throttles
    }

    /// Execute a request, retrying throttled attempts until `timeout` elapses.
    pub async fn execute_within<F>(&self, build: F, timeout: Duration) -> Result<http::Response<Bytes>>
    where
        F: Fn() -> Result<RequestDescriptor> + Send + Sync,
    {
        let timeout = chrono::TimeDelta::from_std(timeout)
            .map_err(|e| Error::config_invalid("execution timeout is out of range").with_source(e))?;
        let deadline = self
            .signer
            .context()
            .now()
            .checked_add_signed(timeout)
            .ok_or_else(|| Error::config_invalid("execution deadline is out of range"))?;

        self.execute(build, deadline).await
    }

    /// Execute a request, retrying throttled attempts until `deadline`.
    ///
    /// `build` is called once per attempt: descriptors carry time dependent
    /// headers and must never be reused across attempts.
    pub async fn execute<F>(&self, build: F, deadline: DateTime) -> Result<http::Response<Bytes>>
    where
        F: Fn() -> Result<RequestDescriptor> + Send + Sync,
    {
        let ctx = self.signer.context();

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            // BUILD
            let mut req = build()?;
            let key = req.resource_key();
            if let Some(throttle) = self.throttles.pending(&key, ctx.now()) {
                self.wait_until(&key, throttle.resume_at, deadline, throttle.retry_after)
                    .await?;
            }

            // SIGN
            self.signer.sign(&mut req).await?;

            // SEND
            self.rate_limit.acquire(ctx).await;
            let uri = req.uri()?.to_string();
            debug!("sending attempt {attempt}: {} {uri}", req.method);
            let resp = ctx.http_send(req.into_http_request()?).await.map_err(|e| {
                Error::transport(format!("failed to send request to {uri}"))
                    .with_uri(uri.clone())
                    .with_source(e)
            })?;

            let status = resp.status();
            if status.is_success() {
                self.throttles.clear(&key);
                return Ok(resp);
            }

            if status != StatusCode::TOO_MANY_REQUESTS {
                self.throttles.clear(&key);
                let (parts, _) = resp.into_parts();
                return Err(Error::http_status(status, parts.headers).with_uri(uri));
            }

            // THROTTLED
            let retry_after = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string());
            let Some(resume_at) = retry_after
                .as_deref()
                .and_then(|v| parse_retry_after(v, ctx.now()))
            else {
                warn!("attempt {attempt} to {uri} throttled without usable Retry-After: {retry_after:?}");
                return Err(
                    Error::throttled(format!("request to {uri} throttled without usable Retry-After"))
                        .with_uri(uri)
                        .with_retry_after(retry_after),
                );
            };

            self.throttles.record(&key, resume_at, retry_after.clone());
            self.wait_until(&uri, resume_at, deadline, retry_after)
                .await?;
        }
    }

    /// Wait for `resume_at`, or fail if it lies beyond `deadline`.
    async fn wait_until(
        &self,
        uri: &str,
        resume_at: DateTime,
        deadline: DateTime,
        retry_after: Option<String>,
    ) -> Result<()> {
        let ctx = self.signer.context();

        if resume_at > deadline {
            warn!(
                "{uri} throttled until {}, beyond deadline {}",
                format_http_date(resume_at),
                format_http_date(deadline)
            );
            return Err(Error::throttled(format!(
                "request to {uri} throttled until {}, which exceeds the deadline {}",
                format_http_date(resume_at),
                format_http_date(deadline)
            ))
            .with_uri(uri)
            .with_retry_after(retry_after));
        }

        let wait = (resume_at - ctx.now()).to_std().unwrap_or_default();
        if !wait.is_zero() {
            debug!("{uri} throttled, retrying in {wait:?}");
            ctx.sleep(wait).await;
        }

        Ok(())
    }
}
