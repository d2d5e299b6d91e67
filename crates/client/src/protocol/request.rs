//! Request head handling for the exchange stage.
//!
//! [`RequestHeader`] wraps `http::Request<()>` and answers the questions the
//! exchange has to ask about a request before and while sending it.

use http::header::{CONNECTION, EXPECT};
use http::request::Parts;
use http::{HeaderMap, HeaderValue, Method, Request, Uri, Version};

/// The head of an outgoing request, with its body split off.
#[derive(Debug)]
pub struct RequestHeader {
    inner: Request<()>,
}

impl AsRef<Request<()>> for RequestHeader {
    fn as_ref(&self) -> &Request<()> {
        &self.inner
    }
}

impl RequestHeader {
    /// Consumes the header and returns the inner `Request<()>`.
    pub fn into_inner(self) -> Request<()> {
        self.inner
    }

    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    pub fn version(&self) -> Version {
        self.inner.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Whether the method may carry a request body at all.
    ///
    /// Only GET and HEAD are excluded; a body attached to either is never sent.
    pub fn permits_body(&self) -> bool {
        !matches!(self.method(), &Method::GET | &Method::HEAD)
    }

    /// Whether the response to this request can never carry a body.
    pub fn is_head(&self) -> bool {
        self.method() == Method::HEAD
    }

    /// `Expect: 100-continue`, compared case-insensitively.
    pub fn expects_continue(&self) -> bool {
        header_eq_ignore_case(self.headers().get(EXPECT), "100-continue")
    }

    /// `Connection: close`, compared case-insensitively.
    pub fn wants_close(&self) -> bool {
        header_eq_ignore_case(self.headers().get(CONNECTION), "close")
    }
}

/// Compares a single header value against `expected`, ignoring ASCII case and
/// surrounding whitespace.
pub(crate) fn header_eq_ignore_case(value: Option<&HeaderValue>, expected: &str) -> bool {
    value.is_some_and(|value| value.as_bytes().trim_ascii().eq_ignore_ascii_case(expected.as_bytes()))
}

impl From<Parts> for RequestHeader {
    #[inline]
    fn from(parts: Parts) -> Self {
        Self { inner: Request::from_parts(parts, ()) }
    }
}

impl From<Request<()>> for RequestHeader {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner }
    }
}
