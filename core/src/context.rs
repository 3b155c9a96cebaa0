// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::time::DateTime;
use crate::{Error, Result};
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Context provides the collaborators used while executing requests.
///
/// ## Important
///
/// reqexec provides NO default transport and NO default secret store. Users MAY configure
/// the components they need. Any unconfigured component will use a no-op implementation
/// that returns errors or empty values when called. The clock defaults to [`SystemClock`].
///
/// ## Example
///
/// ```
/// use reqexec_core::{Context, OsSecretStore};
///
/// // Create a context with explicit implementations
/// let ctx = Context::new()
///     .with_secret_store(OsSecretStore);  // Resolve secrets from process env
/// ```
#[derive(Clone)]
pub struct Context {
    http: Arc<dyn HttpSend>,
    secrets: Arc<dyn SecretStore>,
    clock: Arc<dyn Clock>,
}

impl Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("http", &self.http)
            .field("secrets", &self.secrets)
            .field("clock", &self.clock)
            .finish()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Create a new Context with no-op transport and secret store.
    ///
    /// ```
    /// use reqexec_core::Context;
    ///
    /// let ctx = Context::new();
    /// // You can configure specific components as needed:
    /// // ctx.with_http_send(my_http_client)
    /// //    .with_secret_store(my_secrets)
    /// //    .with_clock(my_clock);
    /// ```
    pub fn new() -> Self {
        Self {
            http: Arc::new(NoopHttpSend),
            secrets: Arc::new(NoopSecretStore),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the HTTP transport implementation.
    pub fn with_http_send(mut self, http: impl HttpSend) -> Self {
        self.http = Arc::new(http);
        self
    }

    /// Replace the secret store implementation.
    pub fn with_secret_store(mut self, secrets: impl SecretStore) -> Self {
        self.secrets = Arc::new(secrets);
        self
    }

    /// Replace the clock implementation.
    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Send http request and return the response.
    #[inline]
    pub async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        self.http.http_send(req).await
    }

    /// Resolve a named secret.
    ///
    /// - Returns `Some(v)` if the secret is configured.
    /// - Returns `None` if the secret is not configured.
    #[inline]
    pub fn secret(&self, id: &str) -> Option<String> {
        self.secrets.secret(id)
    }

    /// Get the current instant from the configured clock.
    #[inline]
    pub fn now(&self) -> DateTime {
        self.clock.now()
    }

    /// Suspend the calling task for `dur` according to the configured clock.
    #[inline]
    pub async fn sleep(&self, dur: Duration) {
        self.clock.sleep(dur).await
    }
}

/// HttpSend is the transport used to exchange a request with the network.
///
/// Implementations should map network and IO failures to [`Error::transport`].
#[async_trait::async_trait]
pub trait HttpSend: Debug + Send + Sync + 'static {
    /// Send http request and return the response.
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>>;
}

/// SecretStore resolves named secrets like account keys, SAS tokens or refresh tokens.
pub trait SecretStore: Debug + Send + Sync + 'static {
    /// Resolve the secret with given id.
    ///
    /// - Returns `Some(v)` if the secret is found and is valid utf-8.
    /// - Returns `None` if the secret is not configured.
    fn secret(&self, id: &str) -> Option<String>;
}

/// Clock supplies the current instant and suspends tasks.
///
/// Injecting a clock keeps expiry checks, `Date` headers and throttle
/// back-off deterministic under test.
#[async_trait::async_trait]
pub trait Clock: Debug + Send + Sync + 'static {
    /// Get the current instant.
    fn now(&self) -> DateTime;

    /// Suspend the calling task for the given duration.
    async fn sleep(&self, dur: Duration);
}

/// Resolves secrets from the environment variables of the current process.
#[derive(Debug, Copy, Clone, Default)]
pub struct OsSecretStore;

impl SecretStore for OsSecretStore {
    fn secret(&self, id: &str) -> Option<String> {
        std::env::var_os(id)?.into_string().ok()
    }
}

/// StaticSecretStore provides a fixed set of secrets.
///
/// This is useful for testing or for secrets resolved once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
    /// The secrets to use.
    pub secrets: HashMap<String, String>,
}

impl StaticSecretStore {
    /// Create a store from `(id, value)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            secrets: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl SecretStore for StaticSecretStore {
    fn secret(&self, id: &str) -> Option<String> {
        self.secrets.get(id).cloned()
    }
}

/// Wall clock backed by chrono and the tokio timer.
#[derive(Debug, Copy, Clone, Default)]
pub struct SystemClock;

#[async_trait::async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime {
        crate::time::now()
    }

    async fn sleep(&self, dur: Duration) {
        tokio::time::sleep(dur).await
    }
}

/// ManualClock only moves when told to.
///
/// `sleep` advances the clock by the requested duration and returns at once,
/// recording the total time slept. Clones share the same time line, so a test
/// can keep one handle while the [`Context`] owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualClockState>>,
}

#[derive(Debug)]
struct ManualClockState {
    now: DateTime,
    slept: Duration,
    sleeps: usize,
}

impl ManualClock {
    /// Create a clock frozen at `now`.
    pub fn new(now: DateTime) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualClockState {
                now,
                slept: Duration::ZERO,
                sleeps: 0,
            })),
        }
    }

    /// Move the clock forward without counting it as sleep.
    pub fn advance(&self, dur: Duration) {
        let mut state = self.inner.lock().expect("lock poisoned");
        state.now += chrono::TimeDelta::from_std(dur).expect("duration in bounds");
    }

    /// Total duration passed to `sleep` so far.
    pub fn total_slept(&self) -> Duration {
        self.inner.lock().expect("lock poisoned").slept
    }

    /// Number of `sleep` calls so far.
    pub fn sleep_count(&self) -> usize {
        self.inner.lock().expect("lock poisoned").sleeps
    }
}

#[async_trait::async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime {
        self.inner.lock().expect("lock poisoned").now
    }

    async fn sleep(&self, dur: Duration) {
        {
            let mut state = self.inner.lock().expect("lock poisoned");
            state.now += chrono::TimeDelta::from_std(dur).expect("duration in bounds");
            state.slept += dur;
            state.sleeps += 1;
        }
        tokio::task::yield_now().await
    }
}

/// NoopHttpSend is a no-op implementation that always returns an error.
///
/// This is used when no HTTP client is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHttpSend;

#[async_trait::async_trait]
impl HttpSend for NoopHttpSend {
    async fn http_send(&self, _req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        Err(Error::transport(
            "HTTP sending not supported: no HTTP client configured",
        ))
    }
}

/// NoopSecretStore is a no-op implementation that never resolves anything.
///
/// This is used when no secret store is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSecretStore;

impl SecretStore for NoopSecretStore {
    fn secret(&self, _id: &str) -> Option<String> {
        None
    }
}
