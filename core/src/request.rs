use std::fmt::Write;
use std::mem;
use std::str::FromStr;
use std::time::Duration;

use bytes::Bytes;
use http::header::HeaderName;
use http::header::CONTENT_TYPE;
use http::uri::Authority;
use http::uri::PathAndQuery;
use http::uri::Scheme;
use http::HeaderMap;
use http::HeaderValue;
use http::Method;
use http::Uri;
use percent_encoding::percent_decode_str;
use percent_encoding::utf8_percent_encode;
use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;

use crate::{Error, Result};

/// AsciiSet for encoding query names and values.
///
/// Everything except `A-Z a-z 0-9 - _ . ~` is encoded.
pub static QUERY_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Per-request timeout carried to the transport in request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTimeout(pub Duration);

/// Body attached to a request.
#[derive(Debug, Clone, Default)]
pub struct Body {
    content_type: Option<String>,
    content: Bytes,
}

impl Body {
    /// Create a body from given bytes.
    pub fn new(content: impl Into<Bytes>) -> Self {
        Self {
            content_type: None,
            content: content.into(),
        }
    }

    /// Declare the content type of this body.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Declared content type, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Body content.
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Length of body content in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Check if the body has no content.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// RequestDescriptor describes one outbound request attempt.
///
/// Descriptors are built incrementally, handed to an authentication strategy
/// for signing and then consumed by the transport. Build a fresh one for every
/// attempt: signatures depend on the time they were made.
///
/// Query pairs are kept in their wire form (percent-encoded). Use
/// [`RequestDescriptor::query_push`] to add decoded values and
/// [`RequestDescriptor::query_append_raw`] to add pre-encoded ones verbatim.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme.
    pub scheme: Scheme,
    /// HTTP authority.
    pub authority: Authority,
    /// HTTP path, raw as it will be sent.
    pub path: String,
    /// HTTP query parameters in wire form.
    pub query: Vec<(String, String)>,
    /// HTTP headers.
    pub headers: HeaderMap,
    /// Optional request body.
    pub body: Option<Body>,
    /// Optional per-request timeout enforced by the transport.
    pub timeout: Option<Duration>,
}

impl RequestDescriptor {
    /// Create a descriptor from method and absolute uri.
    ///
    /// ```
    /// use reqexec_core::RequestDescriptor;
    ///
    /// let req = RequestDescriptor::new(http::Method::GET, "https://a.blob.core.windows.net/c?comp=list").unwrap();
    /// assert_eq!(req.path, "/c");
    /// assert_eq!(req.query, vec![("comp".to_string(), "list".to_string())]);
    /// ```
    pub fn new(method: Method, uri: &str) -> Result<Self> {
        let uri = Uri::from_str(uri)?;
        Self::from_uri(method, uri)
    }

    /// Build a descriptor from `http::request::Parts`.
    ///
    /// Headers are moved out of the parts.
    pub fn from_parts(parts: &mut http::request::Parts) -> Result<Self> {
        let mut req = Self::from_uri(parts.method.clone(), mem::take(&mut parts.uri))?;
        req.headers = mem::take(&mut parts.headers);
        Ok(req)
    }

    fn from_uri(method: Method, uri: Uri) -> Result<Self> {
        let uri = uri.into_parts();
        let paq = uri
            .path_and_query
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        let mut req = RequestDescriptor {
            method,
            scheme: uri.scheme.unwrap_or(Scheme::HTTPS),
            authority: uri.authority.ok_or_else(|| {
                Error::request_invalid("request without authority is invalid for execution")
            })?,
            path: paq.path().to_string(),
            query: vec![],
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        };
        if let Some(query) = paq.query() {
            req.query_append_raw(query);
        }

        Ok(req)
    }

    /// Attach a body.
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set header, replacing all existing values of the same name.
    pub fn header_set(&mut self, name: &str, value: &str) -> Result<()> {
        let name = HeaderName::from_str(name)?;
        self.headers.insert(name, HeaderValue::from_str(value)?);
        Ok(())
    }

    /// Add header, keeping existing values of the same name.
    pub fn header_add(&mut self, name: &str, value: &str) -> Result<()> {
        let name = HeaderName::from_str(name)?;
        self.headers.append(name, HeaderValue::from_str(value)?);
        Ok(())
    }

    /// Get the last value of a header by case-insensitive name.
    pub fn header_get(&self, name: &str) -> Option<&str> {
        self.headers
            .get_all(name)
            .iter()
            .last()
            .and_then(|v| v.to_str().ok())
    }

    /// Get header value by name.
    ///
    /// Returns empty string if header not found.
    #[inline]
    pub fn header_get_or_default(&self, key: &HeaderName) -> Result<&str> {
        match self.headers.get(key) {
            Some(v) => Ok(v.to_str()?),
            None => Ok(""),
        }
    }

    /// Get headers with given prefix, lowercased, sorted by name.
    ///
    /// Multiple values of one header are joined by `,` in insertion order and
    /// headers whose value is empty are skipped.
    pub fn header_to_vec_with_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let mut headers = Vec::new();
        for name in self.headers.keys() {
            // `HeaderName` is always lowercase.
            if !name.as_str().starts_with(prefix) {
                continue;
            }

            let mut value = String::new();
            for (idx, v) in self.headers.get_all(name).iter().enumerate() {
                if idx != 0 {
                    value.push(',');
                }
                value.push_str(v.to_str()?);
            }
            if value.is_empty() {
                continue;
            }
            headers.push((name.as_str().to_string(), value));
        }
        headers.sort();

        Ok(headers)
    }

    /// Push a new decoded query pair, encoding it into wire form.
    #[inline]
    pub fn query_push(&mut self, key: &str, value: &str) {
        self.query.push((
            utf8_percent_encode(key, &QUERY_ENCODE_SET).to_string(),
            utf8_percent_encode(value, &QUERY_ENCODE_SET).to_string(),
        ));
    }

    /// Append an already encoded query string verbatim.
    ///
    /// `a=b&c` is appended as `[("a", "b"), ("c", "")]` without touching the
    /// encoding of any name or value.
    pub fn query_append_raw(&mut self, query: &str) {
        let query = query.strip_prefix('?').unwrap_or(query);
        for pair in query.split('&').filter(|v| !v.is_empty()) {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            self.query.push((k.to_string(), v.to_string()));
        }
    }

    /// Get query pairs percent decoded.
    pub fn query_percent_decoded(&self) -> Vec<(String, String)> {
        self.query
            .iter()
            .map(|(k, v)| {
                (
                    percent_decode_str(k).decode_utf8_lossy().into_owned(),
                    percent_decode_str(v).decode_utf8_lossy().into_owned(),
                )
            })
            .collect()
    }

    /// Get query size.
    #[inline]
    pub fn query_size(&self) -> usize {
        self.query
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum::<usize>()
    }

    /// Build the full uri of this request.
    pub fn uri(&self) -> Result<Uri> {
        let paq = if self.query.is_empty() {
            self.path.clone()
        } else {
            let mut s = String::with_capacity(self.path.len() + self.query_size() + 8);
            s.push_str(&self.path);
            s.push('?');
            for (i, (k, v)) in self.query.iter().enumerate() {
                if i > 0 {
                    s.push('&');
                }

                s.push_str(k);
                if !v.is_empty() {
                    s.push('=');
                    s.push_str(v);
                }
            }
            s
        };

        let mut parts = http::uri::Parts::default();
        parts.scheme = Some(self.scheme.clone());
        parts.authority = Some(self.authority.clone());
        parts.path_and_query = Some(PathAndQuery::from_str(&paq)?);
        Ok(Uri::from_parts(parts)?)
    }

    /// Key identifying the resource this request targets: scheme, authority
    /// and path without query.
    pub fn resource_key(&self) -> String {
        let mut s = String::with_capacity(self.path.len() + 32);
        // Writing into a String never fails.
        let _ = write!(s, "{}://{}{}", self.scheme, self.authority, self.path);
        s
    }

    /// Convert into an `http::Request` ready for the transport.
    ///
    /// A body with a declared content type fills in a missing `Content-Type`
    /// header. The timeout is stored as a [`RequestTimeout`] extension.
    pub fn into_http_request(mut self) -> Result<http::Request<Bytes>> {
        let uri = self.uri()?;

        let content = match self.body.take() {
            Some(body) => {
                if let Some(ct) = body.content_type() {
                    if !self.headers.contains_key(CONTENT_TYPE) {
                        self.headers.insert(CONTENT_TYPE, HeaderValue::from_str(ct)?);
                    }
                }
                body.content
            }
            None => Bytes::new(),
        };

        let mut req = http::Request::new(content);
        *req.method_mut() = self.method;
        *req.uri_mut() = uri;
        *req.headers_mut() = self.headers;
        if let Some(timeout) = self.timeout {
            req.extensions_mut().insert(RequestTimeout(timeout));
        }

        Ok(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_keeps_raw_path_and_query() {
        let req = RequestDescriptor::new(
            Method::GET,
            "https://test.blob.core.windows.net/c/a%20b?prefix=x%2Fy&comp=list&flag",
        )
        .unwrap();

        assert_eq!(req.path, "/c/a%20b");
        assert_eq!(
            req.query,
            vec![
                ("prefix".to_string(), "x%2Fy".to_string()),
                ("comp".to_string(), "list".to_string()),
                ("flag".to_string(), "".to_string()),
            ]
        );
        assert_eq!(
            req.uri().unwrap().to_string(),
            "https://test.blob.core.windows.net/c/a%20b?prefix=x%2Fy&comp=list&flag"
        );
    }

    #[test]
    fn test_new_requires_authority() {
        let err = RequestDescriptor::new(Method::GET, "/only/path").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::RequestInvalid);
    }

    #[test]
    fn test_headers_set_and_add() {
        let mut req = RequestDescriptor::new(Method::PUT, "https://a/b").unwrap();
        req.header_set("X-MS-Meta-Name", "one").unwrap();
        req.header_set("x-ms-meta-name", "two").unwrap();
        req.header_add("x-ms-meta-list", "a").unwrap();
        req.header_add("X-Ms-Meta-List", "b").unwrap();
        req.header_set("x-ms-empty", "").unwrap();
        req.header_set("content-type", "text/plain").unwrap();

        assert_eq!(req.header_get("X-MS-META-NAME"), Some("two"));
        assert_eq!(req.header_get("x-ms-meta-list"), Some("b"));
        assert_eq!(
            req.header_to_vec_with_prefix("x-ms-").unwrap(),
            vec![
                ("x-ms-meta-list".to_string(), "a,b".to_string()),
                ("x-ms-meta-name".to_string(), "two".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_push_encodes_and_decodes() {
        let mut req = RequestDescriptor::new(Method::GET, "https://a/b").unwrap();
        req.query_push("prefix", "dir/sub dir");
        req.query_append_raw("sig=ab%2Bc%3D&se=2022-01-01T11:00:14Z");

        assert_eq!(
            req.uri().unwrap().to_string(),
            "https://a/b?prefix=dir%2Fsub%20dir&sig=ab%2Bc%3D&se=2022-01-01T11:00:14Z"
        );
        assert_eq!(
            req.query_percent_decoded(),
            vec![
                ("prefix".to_string(), "dir/sub dir".to_string()),
                ("sig".to_string(), "ab+c=".to_string()),
                ("se".to_string(), "2022-01-01T11:00:14Z".to_string()),
            ]
        );
    }

    #[test]
    fn test_resource_key_ignores_query() {
        let req = RequestDescriptor::new(Method::GET, "https://a.blob/c/b?comp=list").unwrap();
        assert_eq!(req.resource_key(), "https://a.blob/c/b");
    }

    #[test]
    fn test_into_http_request() {
        let req = RequestDescriptor::new(Method::PUT, "https://a/b?x=1")
            .unwrap()
            .with_body(Body::new("hello").with_content_type("text/plain"))
            .with_timeout(Duration::from_secs(7));

        let req = req.into_http_request().unwrap();
        assert_eq!(req.method(), Method::PUT);
        assert_eq!(req.uri(), "https://a/b?x=1");
        assert_eq!(req.headers().get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(req.body().as_ref(), b"hello");
        assert_eq!(
            req.extensions().get::<RequestTimeout>(),
            Some(&RequestTimeout(Duration::from_secs(7)))
        );
    }

    #[test]
    fn test_into_http_request_keeps_explicit_content_type() {
        let mut req = RequestDescriptor::new(Method::PUT, "https://a/b")
            .unwrap()
            .with_body(Body::new("{}").with_content_type("application/json"));
        req.header_set("Content-Type", "application/xml").unwrap();

        let req = req.into_http_request().unwrap();
        assert_eq!(req.headers().get(CONTENT_TYPE).unwrap(), "application/xml");
    }
}
