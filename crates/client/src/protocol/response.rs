//! Response head and the exchange metadata attached to every response.
//!
//! A response leaves the exchange as a plain `http::Response<ResponseBody>`.
//! What the exchange knows about how it was produced travels in the response
//! extensions as [`ExchangeInfo`] and [`ExchangeId`]; [`ResponseExt`] reads
//! them back.

use std::sync::Arc;
use std::time::SystemTime;

use http::Response;

use crate::connection::Handshake;
use crate::protocol::RequestHeader;

/// Type alias for a response head before its body is attached.
pub type ResponseHead = Response<()>;

/// Identity of one exchange on a codec.
///
/// The codec hands out a new id for every request it writes; the response head
/// carries it so the body reader can be opened against the right exchange.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ExchangeId(u64);

impl ExchangeId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// What the exchange stage records on the response it produced.
#[derive(Debug, Clone)]
pub struct ExchangeInfo {
    request: Arc<RequestHeader>,
    handshake: Option<Handshake>,
    sent_request_at: SystemTime,
    received_response_at: SystemTime,
}

impl ExchangeInfo {
    pub fn new(
        request: Arc<RequestHeader>,
        handshake: Option<Handshake>,
        sent_request_at: SystemTime,
        received_response_at: SystemTime,
    ) -> Self {
        Self { request, handshake, sent_request_at, received_response_at }
    }

    /// The head of the request that produced the response
    pub fn request(&self) -> &RequestHeader {
        &self.request
    }

    pub fn handshake(&self) -> Option<&Handshake> {
        self.handshake.as_ref()
    }

    /// Taken just before the request headers were written
    pub fn sent_request_at(&self) -> SystemTime {
        self.sent_request_at
    }

    /// Taken right after the final response headers were read
    pub fn received_response_at(&self) -> SystemTime {
        self.received_response_at
    }
}

/// Typed access to the exchange metadata of a response.
pub trait ResponseExt {
    fn exchange_info(&self) -> Option<&ExchangeInfo>;

    fn exchange_id(&self) -> Option<ExchangeId>;

    fn request(&self) -> Option<&RequestHeader> {
        self.exchange_info().map(ExchangeInfo::request)
    }

    fn handshake(&self) -> Option<&Handshake> {
        self.exchange_info().and_then(ExchangeInfo::handshake)
    }

    fn sent_request_at(&self) -> Option<SystemTime> {
        self.exchange_info().map(ExchangeInfo::sent_request_at)
    }

    fn received_response_at(&self) -> Option<SystemTime> {
        self.exchange_info().map(ExchangeInfo::received_response_at)
    }
}

impl<T> ResponseExt for Response<T> {
    fn exchange_info(&self) -> Option<&ExchangeInfo> {
        self.extensions().get::<ExchangeInfo>()
    }

    fn exchange_id(&self) -> Option<ExchangeId> {
        self.extensions().get::<ExchangeId>().copied()
    }
}
