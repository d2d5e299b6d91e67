//! Observers of an exchange.
//!
//! An [`EventListener`] is told when each phase of an exchange starts and ends.
//! Every callback returns a [`ListenerResult`]; an error is logged and otherwise
//! ignored, a listener can never fail the exchange it is watching.

use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::protocol::{RequestHeader, ResponseHead};

pub type ListenerResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Identifies one call across all events it produces.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CallId(u64);

static NEXT_CALL_ID: AtomicU64 = AtomicU64::new(1);

impl CallId {
    pub fn next() -> Self {
        Self(NEXT_CALL_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call-{}", self.0)
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait EventListener: Send + Sync {
    fn request_headers_start(&self, _call: CallId) -> ListenerResult {
        Ok(())
    }

    fn request_headers_end(&self, _call: CallId, _request: &RequestHeader) -> ListenerResult {
        Ok(())
    }

    fn request_body_start(&self, _call: CallId) -> ListenerResult {
        Ok(())
    }

    /// `byte_count` is what the body writer actually got onto the body sink
    fn request_body_end(&self, _call: CallId, _byte_count: u64) -> ListenerResult {
        Ok(())
    }

    fn response_headers_start(&self, _call: CallId) -> ListenerResult {
        Ok(())
    }

    fn response_headers_end(&self, _call: CallId, _response: &ResponseHead) -> ListenerResult {
        Ok(())
    }
}

/// Listener that ignores every event.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoopListener;

impl EventListener for NoopListener {}
