use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::TimeZone;
use http::StatusCode;
use log::{debug, warn};
use pretty_assertions::assert_eq;
use reqexec_azure_storage::{
    AuthScheme, Credential, DefaultCredentialProvider, RefreshCredentialProvider, RequestSigner,
    StaticCredentialProvider,
};
use reqexec_core::time::DateTime;
use reqexec_core::{
    Context, ErrorKind, Executor, HttpSend, ManualClock, OsSecretStore, RequestDescriptor, Result,
    Signer,
};
use reqexec_http_send_reqwest::ReqwestHttpSend;

/// Transport that answers from a script and keeps what it was sent.
#[derive(Debug, Default)]
struct MockHttpSend {
    responses: Mutex<Vec<http::Response<Bytes>>>,
    requests: Mutex<Vec<http::Request<Bytes>>>,
}

impl MockHttpSend {
    fn new(statuses: &[(u16, Option<&str>)]) -> Arc<Self> {
        let responses = statuses
            .iter()
            .rev()
            .map(|(status, retry_after)| {
                let mut builder = http::Response::builder().status(*status);
                if let Some(v) = retry_after {
                    builder = builder.header(http::header::RETRY_AFTER, *v);
                }
                builder.body(Bytes::new()).unwrap()
            })
            .collect();

        Arc::new(Self {
            responses: Mutex::new(responses),
            requests: Mutex::default(),
        })
    }

    fn header(&self, idx: usize, name: &str) -> Option<String> {
        self.requests.lock().unwrap()[idx]
            .headers()
            .get(name)
            .map(|v| v.to_str().unwrap().to_string())
    }

    fn uri(&self, idx: usize) -> String {
        self.requests.lock().unwrap()[idx].uri().to_string()
    }
}

#[derive(Debug, Clone)]
struct SharedMock(Arc<MockHttpSend>);

#[async_trait]
impl HttpSend for SharedMock {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        self.0.requests.lock().unwrap().push(req);
        Ok(self
            .0
            .responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| http::Response::new(Bytes::new())))
    }
}

fn start() -> DateTime {
    chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn context(clock: &ManualClock, http: &Arc<MockHttpSend>) -> Context {
    Context::new()
        .with_clock(clock.clone())
        .with_http_send(SharedMock(http.clone()))
}

fn get_blob() -> Result<RequestDescriptor> {
    RequestDescriptor::new(http::Method::GET, "http://127.0.0.1:10000/container/blob")
}

#[tokio::test]
async fn test_shared_key_is_resigned_after_throttle() {
    let _ = env_logger::builder().is_test(true).try_init();

    let clock = ManualClock::new(start());
    let http = MockHttpSend::new(&[(429, Some("1")), (200, None)]);
    let signer = Signer::new(
        context(&clock, &http),
        StaticCredentialProvider::new_shared_key("devstoreaccount1", "a2V5").unwrap(),
        RequestSigner::new(AuthScheme::SharedKey),
    );

    let resp = Executor::new(signer)
        .execute_within(get_blob, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(clock.total_slept(), Duration::from_secs(1));
    assert_eq!(
        http.header(0, "date").as_deref(),
        Some("Mon, 01 Jan 2024 00:00:00 +0000")
    );
    assert_eq!(
        http.header(0, "authorization").as_deref(),
        Some("SharedKey devstoreaccount1:xH8Tfq0UNh5eFkXOxLTJuhBXpCgTHT7UH576VqA5d3U=")
    );
    // The retry carries a fresh date and therefore a fresh signature.
    assert_eq!(
        http.header(1, "date").as_deref(),
        Some("Mon, 01 Jan 2024 00:00:01 +0000")
    );
    assert_ne!(http.header(0, "authorization"), http.header(1, "authorization"));
}

#[tokio::test]
async fn test_throttle_beyond_deadline_is_not_waited_for() {
    let clock = ManualClock::new(start());
    let http = MockHttpSend::new(&[(429, Some("10"))]);
    let signer = Signer::new(
        context(&clock, &http),
        StaticCredentialProvider::new_shared_key("devstoreaccount1", "a2V5").unwrap(),
        RequestSigner::new(AuthScheme::SharedKeyLite),
    );

    let err = Executor::new(signer)
        .execute_within(get_blob, Duration::from_secs(2))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Throttled);
    assert_eq!(err.retry_after(), Some("10"));
    assert_eq!(clock.sleep_count(), 0);
}

#[tokio::test]
async fn test_bearer_token_is_refreshed_on_expiry() {
    let clock = ManualClock::new(start());
    let http = MockHttpSend::new(&[]);
    let refreshes = Arc::new(AtomicUsize::new(0));

    let provider = {
        let refreshes = refreshes.clone();
        RefreshCredentialProvider::new(move |_previous: Option<Credential>| {
            let n = refreshes.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                Ok(Some(Credential::with_bearer_token(
                    &format!("token-{n}"),
                    Some(start() + chrono::TimeDelta::seconds(60 * n as i64)),
                )))
            }
        })
    };
    let executor = Executor::new(Signer::new(
        context(&clock, &http),
        provider,
        RequestSigner::new(AuthScheme::Bearer),
    ));

    executor
        .execute_within(get_blob, Duration::from_secs(5))
        .await
        .unwrap();
    clock.advance(Duration::from_secs(30));
    executor
        .execute_within(get_blob, Duration::from_secs(5))
        .await
        .unwrap();
    clock.advance(Duration::from_secs(30));
    executor
        .execute_within(get_blob, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(refreshes.load(Ordering::SeqCst), 2);
    assert_eq!(http.header(0, "authorization").as_deref(), Some("Bearer token-1"));
    assert_eq!(http.header(1, "authorization").as_deref(), Some("Bearer token-1"));
    assert_eq!(http.header(2, "authorization").as_deref(), Some("Bearer token-2"));
}

#[tokio::test]
async fn test_bearer_without_token_is_anonymous() {
    let clock = ManualClock::new(start());
    let http = MockHttpSend::new(&[]);
    let executor = Executor::new(Signer::new(
        context(&clock, &http),
        RefreshCredentialProvider::new(|_| async { Ok(None) }),
        RequestSigner::new(AuthScheme::Bearer),
    ));

    executor
        .execute_within(get_blob, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(http.header(0, "authorization"), None);
}

#[tokio::test]
async fn test_sas_token_is_supplied_lazily() {
    let clock = ManualClock::new(start());
    let http = MockHttpSend::new(&[]);
    let supplied = Arc::new(AtomicUsize::new(0));

    let provider = {
        let supplied = supplied.clone();
        RefreshCredentialProvider::new(move |_| {
            let n = supplied.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                Ok(Some(Credential::SasToken {
                    token: format!("sv=2021-01-01&sig=sig{n}%3D"),
                    expires_at: Some(start() + chrono::TimeDelta::seconds(10)),
                }))
            }
        })
    };
    let executor = Executor::new(Signer::new(
        context(&clock, &http),
        provider,
        RequestSigner::new(AuthScheme::Sas),
    ));

    executor
        .execute_within(get_blob, Duration::from_secs(5))
        .await
        .unwrap();
    executor
        .execute_within(get_blob, Duration::from_secs(5))
        .await
        .unwrap();
    clock.advance(Duration::from_secs(10));
    executor
        .execute_within(get_blob, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(supplied.load(Ordering::SeqCst), 2);
    assert_eq!(
        http.uri(0),
        "http://127.0.0.1:10000/container/blob?sv=2021-01-01&sig=sig1%3D"
    );
    assert_eq!(
        http.uri(2),
        "http://127.0.0.1:10000/container/blob?sv=2021-01-01&sig=sig2%3D"
    );
}

#[tokio::test]
async fn test_http_status_error_is_returned() {
    let clock = ManualClock::new(start());
    let http = MockHttpSend::new(&[(403, None)]);
    let signer = Signer::new(
        context(&clock, &http),
        StaticCredentialProvider::new_shared_key("devstoreaccount1", "a2V5").unwrap(),
        RequestSigner::new(AuthScheme::SharedKey),
    );

    let err = Executor::new(signer)
        .execute_within(get_blob, Duration::from_secs(5))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HttpStatus);
    assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
}

#[tokio::test]
async fn test_missing_shared_key_fails_before_sending() {
    let clock = ManualClock::new(start());
    let http = MockHttpSend::new(&[]);
    let signer = Signer::new(
        context(&clock, &http),
        DefaultCredentialProvider::new(),
        RequestSigner::new(AuthScheme::SharedKey),
    );

    let err = Executor::new(signer)
        .execute_within(get_blob, Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(err.is_authentication_error());
    assert!(http.requests.lock().unwrap().is_empty());
}

fn init_live_executor() -> Option<(Executor<Credential>, String)> {
    let _ = env_logger::builder().is_test(true).try_init();
    let _ = dotenv::dotenv();

    if env::var("REQEXEC_AZURE_STORAGE_TEST").ok().as_deref() != Some("on") {
        return None;
    }

    let url = env::var("REQEXEC_AZURE_STORAGE_URL").expect("env REQEXEC_AZURE_STORAGE_URL must set");
    let ctx = Context::new()
        .with_http_send(ReqwestHttpSend::default())
        .with_secret_store(OsSecretStore);
    let signer = Signer::new(
        ctx,
        DefaultCredentialProvider::new(),
        RequestSigner::new(AuthScheme::SharedKey),
    );

    Some((Executor::new(signer), url))
}

#[tokio::test]
async fn test_live_head_blob() -> Result<()> {
    let Some((executor, url)) = init_live_executor() else {
        warn!("REQEXEC_AZURE_STORAGE_TEST is not set, skipped");
        return Ok(());
    };

    let err = executor
        .execute_within(
            || {
                let mut req = RequestDescriptor::new(
                    http::Method::HEAD,
                    &format!("{url}/not_exist_file"),
                )?;
                req.header_set("x-ms-version", "2023-01-03")?;
                Ok(req)
            },
            Duration::from_secs(30),
        )
        .await
        .unwrap_err();

    debug!("got error: {err:?}");
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    Ok(())
}
