use crate::constants::CONTENT_MD5;
use http::header::{self, HeaderName};
use log::debug;
use reqexec_core::{RequestDescriptor, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Protocol variant of Shared Key authorization.
///
/// - [Authorize with Shared Key](https://learn.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SharedKeyVariant {
    /// Shared Key for the Blob, Queue and File services.
    Full,
    /// Shared Key Lite.
    Lite,
    /// Shared Key Lite as accepted by the Queue and Table services.
    Queue,
}

static FULL_HEADERS: [HeaderName; 11] = [
    header::CONTENT_ENCODING,
    header::CONTENT_LANGUAGE,
    header::CONTENT_LENGTH,
    CONTENT_MD5,
    header::CONTENT_TYPE,
    header::DATE,
    header::IF_MODIFIED_SINCE,
    header::IF_MATCH,
    header::IF_NONE_MATCH,
    header::IF_UNMODIFIED_SINCE,
    header::RANGE,
];

static LITE_HEADERS: [HeaderName; 3] = [CONTENT_MD5, header::CONTENT_TYPE, header::DATE];

impl SharedKeyVariant {
    /// Headers whose values enter the string to sign, in order.
    pub fn signed_headers(&self) -> &'static [HeaderName] {
        match self {
            SharedKeyVariant::Full => &FULL_HEADERS,
            SharedKeyVariant::Lite | SharedKeyVariant::Queue => &LITE_HEADERS,
        }
    }

    /// Scheme used in the `Authorization` header.
    pub fn scheme(&self) -> &'static str {
        match self {
            SharedKeyVariant::Full => "SharedKey",
            SharedKeyVariant::Lite | SharedKeyVariant::Queue => "SharedKeyLite",
        }
    }
}

/// Construct string to sign
///
/// ## Format
///
/// ```text
/// VERB + "\n" +
/// for each signed header: value + "\n" +
/// CanonicalizedHeaders +
/// CanonicalizedResource;
/// ```
///
/// Full signs Content-Encoding, Content-Language, Content-Length,
/// Content-MD5, Content-Type, Date, If-Modified-Since, If-Match,
/// If-None-Match, If-Unmodified-Since and Range. Lite and Queue sign
/// Content-MD5, Content-Type and Date.
///
/// The result only depends on the request: reordering headers or query
/// parameters doesn't change it.
///
/// ## Reference
///
/// - [Blob, Queue, and File Services (Shared Key authorization)](https://learn.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key)
pub fn string_to_sign(
    req: &RequestDescriptor,
    variant: SharedKeyVariant,
    account_name: &str,
) -> Result<String> {
    let mut s = String::with_capacity(128);

    s.push_str(req.method.as_str());
    s.push('\n');

    for name in variant.signed_headers() {
        s.push_str(signed_header_value(req, variant, name)?);
        s.push('\n');
    }

    s.push_str(&canonicalize_header(req)?);
    s.push_str(&canonicalize_resource(req, account_name));

    debug!("string to sign: {}", &s);

    Ok(s)
}

fn signed_header_value<'a>(
    req: &'a RequestDescriptor,
    variant: SharedKeyVariant,
    name: &HeaderName,
) -> Result<&'a str> {
    let value = req.header_get_or_default(name)?;

    if name == header::CONTENT_TYPE && !req.headers.contains_key(header::CONTENT_TYPE) {
        if let Some(ct) = req.body.as_ref().and_then(|b| b.content_type()) {
            return Ok(ct);
        }
    }

    // Only content type is blanked, every other header is signed raw.
    if variant == SharedKeyVariant::Full && name == header::CONTENT_TYPE && value == "0" {
        return Ok("");
    }

    Ok(value)
}

/// ## Reference
///
/// - [Constructing the canonicalized headers string](https://learn.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key#constructing-the-canonicalized-headers-string)
fn canonicalize_header(req: &RequestDescriptor) -> Result<String> {
    let mut s = String::new();
    for (name, value) in req.header_to_vec_with_prefix("x-ms-")? {
        s.push_str(&name);
        s.push(':');
        s.push_str(&value);
        s.push('\n');
    }

    Ok(s)
}

/// ## Reference
///
/// - [Constructing the canonicalized resource string](https://learn.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key#constructing-the-canonicalized-resource-string)
fn canonicalize_resource(req: &RequestDescriptor, account_name: &str) -> String {
    let mut s = format!("/{}{}", account_name, req.path);

    // `comp` and `comp=` both carry one empty value and sign as `comp:`.
    let mut query: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (k, v) in req.query_percent_decoded() {
        query.entry(k.to_lowercase()).or_default().insert(v);
    }

    for (name, values) in query {
        s.push('\n');
        s.push_str(&name);
        s.push(':');
        s.push_str(&values.into_iter().collect::<Vec<_>>().join(","));
    }

    s
}
