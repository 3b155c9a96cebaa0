use std::fmt;

use http::HeaderMap;
use http::StatusCode;
use thiserror::Error;

/// The error type for reqexec operations
#[derive(Error, Debug)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<anyhow::Error>,

    uri: Option<String>,
    status: Option<StatusCode>,
    reason: Option<String>,
    headers: Option<HeaderMap>,
    retry_after: Option<String>,
}

/// The kind of error that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credential material is missing or invalid.
    ///
    /// Never retried, surfaced to the caller immediately.
    Authentication,

    /// The server throttled the request (HTTP 429) and waiting for it
    /// would exceed the caller's deadline.
    Throttled,

    /// The server answered with a status that is neither success nor 429.
    HttpStatus,

    /// The request could not be exchanged with the remote at all.
    Transport,

    /// Request cannot be materialized (invalid uri, header, etc.)
    RequestInvalid,

    /// Configuration error (missing fields, invalid values)
    ConfigInvalid,

    /// Unexpected errors
    Unexpected,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            uri: None,
            status: None,
            reason: None,
            headers: None,
            retry_after: None,
        }
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attach the uri of the request this error belongs to.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Attach the raw `Retry-After` value returned by the server.
    pub fn with_retry_after(mut self, retry_after: Option<String>) -> Self {
        self.retry_after = retry_after;
        self
    }

    /// Attach the response status, reason phrase and headers.
    pub fn with_response(
        mut self,
        status: StatusCode,
        reason: Option<&str>,
        headers: HeaderMap,
    ) -> Self {
        self.status = Some(status);
        self.reason = reason.map(str::to_string);
        self.headers = Some(headers);
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the uri of the failed request, if known.
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Get the response status code, if the server answered.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Get the response reason phrase, if the server answered.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Get the response headers, if the server answered.
    pub fn headers(&self) -> Option<&HeaderMap> {
        self.headers.as_ref()
    }

    /// Get the raw `Retry-After` value of a throttled response.
    pub fn retry_after(&self) -> Option<&str> {
        self.retry_after.as_deref()
    }

    /// Check if this is an authentication error
    pub fn is_authentication_error(&self) -> bool {
        self.kind == ErrorKind::Authentication
    }

    /// Check if this is a throttling error
    pub fn is_throttled(&self) -> bool {
        self.kind == ErrorKind::Throttled
    }
}

// Convenience constructors
impl Error {
    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Create a throttled error
    pub fn throttled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Throttled, message)
    }

    /// Create an http status error from the parts of a failed response.
    ///
    /// `http::Response` doesn't carry the phrase sent on the wire, so the
    /// reason is the canonical phrase of `status`. Codes without one, like
    /// `599`, have no reason.
    pub fn http_status(status: StatusCode, headers: HeaderMap) -> Self {
        let reason = status.canonical_reason();
        let message = match reason {
            Some(reason) => format!("server responded with {} {reason}", status.as_u16()),
            None => format!("server responded with {}", status.as_u16()),
        };
        Self::new(ErrorKind::HttpStatus, message).with_response(status, reason, headers)
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Create a request invalid error
    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestInvalid, message)
    }

    /// Create a config invalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Authentication => write!(f, "authentication failed"),
            ErrorKind::Throttled => write!(f, "throttled"),
            ErrorKind::HttpStatus => write!(f, "unexpected http status"),
            ErrorKind::Transport => write!(f, "transport failure"),
            ErrorKind::RequestInvalid => write!(f, "invalid request"),
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

// Common From implementations
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(err)
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::ToStrError> for Error {
    fn from(err: http::header::ToStrError) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(err: http::uri::InvalidUri) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUriParts> for Error {
    fn from(err: http::uri::InvalidUriParts) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::method::InvalidMethod> for Error {
    fn from(err: http::method::InvalidMethod) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}
