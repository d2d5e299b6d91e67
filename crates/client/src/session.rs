//! Per-client session header.
//!
//! A [`SessionProvider`] attached to [`CallServer`](crate::exchange::CallServer)
//! supplies one extra header for every request, typically a session cookie or
//! token. The header is written next to the request headers on the wire; the
//! request itself is left untouched.

use http::{HeaderName, HeaderValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHeader {
    name: HeaderName,
    value: HeaderValue,
}

impl SessionHeader {
    pub fn new(name: HeaderName, value: HeaderValue) -> Self {
        Self { name, value }
    }

    pub fn name(&self) -> &HeaderName {
        &self.name
    }

    pub fn value(&self) -> &HeaderValue {
        &self.value
    }
}

pub trait SessionProvider: Send + Sync {
    /// The header to add to the next request, `None` when there is no session.
    fn session_header(&self) -> Option<SessionHeader>;
}

/// A session header that never changes.
#[derive(Debug, Clone)]
pub struct StaticSession(SessionHeader);

impl StaticSession {
    pub fn new(name: HeaderName, value: HeaderValue) -> Self {
        Self(SessionHeader::new(name, value))
    }
}

impl SessionProvider for StaticSession {
    fn session_header(&self) -> Option<SessionHeader> {
        Some(self.0.clone())
    }
}
