//! [`HttpSend`] implementation backed by [`reqwest`].

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::BodyExt;
use log::debug;
use reqexec_core::{Error, HttpSend, RequestTimeout, Result};
use reqwest::{Client, Request};

/// ReqwestHttpSend sends requests with a [`reqwest::Client`].
///
/// A [`RequestTimeout`] extension on the request is applied as the timeout of
/// that single exchange.
#[derive(Debug, Default, Clone)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let uri = req.uri().to_string();
        let timeout = req.extensions().get::<RequestTimeout>().map(|t| t.0);

        let mut req = Request::try_from(req).map_err(|e| {
            Error::request_invalid("failed to convert request for reqwest")
                .with_uri(uri.clone())
                .with_source(e)
        })?;
        if let Some(timeout) = timeout {
            debug!("applying timeout {timeout:?} to request {uri}");
            *req.timeout_mut() = Some(timeout);
        }

        let resp: http::Response<_> = self
            .client
            .execute(req)
            .await
            .map_err(|e| transport_error(&uri, e))?
            .into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(|e| transport_error(&uri, e))?;
        Ok(http::Response::from_parts(parts, bs))
    }
}

fn transport_error(uri: &str, err: reqwest::Error) -> Error {
    let message = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "failed to connect"
    } else {
        "failed to exchange request"
    };

    Error::transport(message).with_uri(uri).with_source(err)
}
