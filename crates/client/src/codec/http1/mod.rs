//! HTTP/1.x implementation of [`ExchangeCodec`].
//!
//! The write half is driven through a `FramedWrite` with a [`RequestEncoder`],
//! the read half through a `FramedRead` with a [`ResponseDecoder`]. Both are kept
//! behind shared handles so that body sinks and body readers created for an
//! exchange outlive the call that created them.
//!
//! [`RequestEncoder`]: crate::codec::RequestEncoder
//! [`ResponseDecoder`]: crate::codec::ResponseDecoder

mod body;
mod shared;

pub use body::{Http1Body, Http1BodySink};

use async_trait::async_trait;
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{Request, StatusCode};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace};

use crate::codec::ExchangeCodec;
use crate::codec::header::{is_chunked, parse_content_length};
use crate::ensure;
use crate::protocol::body::{BodySink, ResponseBody};
use crate::protocol::{ExchangeId, Message, ParseError, PayloadSize, RequestHeader, ResponseHead, SendError};
use crate::session::SessionHeader;
use shared::{SharedReader, SharedWriter};

/// Initial size of the read buffer
pub const DEFAULT_READ_CAPACITY: usize = 8 * 1024;

/// An HTTP/1.x codec over a split connection.
pub struct Http1Codec<R, W> {
    reader: SharedReader<R>,
    writer: SharedWriter<W>,
    exchange_id: ExchangeId,
    request_payload: Option<PayloadSize>,
    body_opened: bool,
    head_request: bool,
}

impl<R, W> Http1Codec<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_capacity(reader, writer, DEFAULT_READ_CAPACITY)
    }

    pub fn with_capacity(reader: R, writer: W, read_capacity: usize) -> Self {
        Self {
            reader: SharedReader::with_capacity(reader, read_capacity),
            writer: SharedWriter::new(writer),
            exchange_id: ExchangeId::new(0),
            request_payload: None,
            body_opened: false,
            head_request: false,
        }
    }
}

/// The head that actually goes on the wire: a copy of the request head plus
/// the session header.
fn wire_head(request: &RequestHeader, session: Option<&SessionHeader>) -> RequestHeader {
    let mut head = Request::new(());
    *head.method_mut() = request.method().clone();
    *head.uri_mut() = request.uri().clone();
    *head.version_mut() = request.version();
    *head.headers_mut() = request.headers().clone();

    if let Some(session) = session {
        head.headers_mut().insert(session.name().clone(), session.value().clone());
    }
    RequestHeader::from(head)
}

/// Decides how the body of `head` is delimited.
///
/// Responses to HEAD and 1xx or 304 responses never carry a body. A 204 or 205
/// normally has none either, but framing headers on it are honored so the
/// caller can see and reject them.
fn response_payload_size(head: &ResponseHead, head_request: bool) -> Result<PayloadSize, ParseError> {
    let status = head.status();
    if head_request || status.is_informational() || status == StatusCode::NOT_MODIFIED {
        return Ok(PayloadSize::Empty);
    }

    let headers = head.headers();
    let transfer_encoding = headers.get(TRANSFER_ENCODING);
    if is_chunked(transfer_encoding) {
        return Ok(PayloadSize::Chunked);
    }

    match headers.get(CONTENT_LENGTH) {
        Some(value) => Ok(PayloadSize::Length(parse_content_length(value)?)),
        None if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT => Ok(PayloadSize::Empty),
        None => Ok(PayloadSize::UntilClose),
    }
}

#[async_trait]
impl<R, W> ExchangeCodec for Http1Codec<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn write_request_headers(
        &mut self,
        request: &RequestHeader,
        payload_size: PayloadSize,
        session: Option<&SessionHeader>,
    ) -> Result<(), SendError> {
        self.exchange_id = self.exchange_id.next();
        self.request_payload = Some(payload_size);
        self.body_opened = false;
        self.head_request = request.is_head();

        debug!(
            exchange = self.exchange_id.get(),
            method = %request.method(),
            uri = %request.uri(),
            ?payload_size,
            "write request headers"
        );
        self.writer.feed(Message::Header((wire_head(request, session), payload_size))).await
    }

    async fn flush_request(&mut self) -> Result<(), SendError> {
        self.writer.flush().await
    }

    fn create_request_body(&mut self, _request: &RequestHeader, content_length: Option<u64>) -> Result<BodySink, SendError> {
        match (self.request_payload, content_length) {
            (Some(PayloadSize::Length(expected)), Some(actual)) if expected == actual => {}
            (Some(PayloadSize::Chunked), None) => {}
            (framing, _) => {
                return Err(SendError::invalid_body(format!(
                    "body of length {content_length:?} doesn't match the request framing {framing:?}"
                )));
            }
        }

        self.body_opened = true;
        Ok(Box::pin(Http1BodySink::new(self.writer.clone())))
    }

    /// A body announced by the head but never opened was skipped, typically
    /// after an early final response to `Expect: 100-continue`; it is dropped.
    /// A body that was opened has to be closed first.
    async fn finish_request(&mut self) -> Result<(), SendError> {
        if self.body_opened {
            ensure!(!self.writer.is_in_body()?, SendError::invalid_body("request body was not closed"));
        } else if self.writer.abandon_body()? {
            debug!(exchange = self.exchange_id.get(), "request body skipped, connection can't be reused");
        }
        self.writer.flush().await?;
        trace!(exchange = self.exchange_id.get(), "request finished");
        Ok(())
    }

    async fn read_response_headers(&mut self, expect_continue: bool) -> Result<Option<ResponseHead>, ParseError> {
        ensure!(!self.reader.is_in_body()?, ParseError::invalid_body("previous response body was not read to the end"));

        loop {
            let mut head = match self.reader.next().await {
                Some(Ok(Message::Header(head))) => head,
                Some(Ok(Message::Payload(_))) => {
                    return Err(ParseError::invalid_body("body bytes where a response head was expected"));
                }
                Some(Err(e)) => return Err(e),
                None => return Err(ParseError::unexpected_eof("connection closed before the response head")),
            };

            let status = head.status();
            if expect_continue && status == StatusCode::CONTINUE {
                trace!(exchange = self.exchange_id.get(), "received 100 continue");
                return Ok(None);
            }

            // 100 and 101 are the caller's business, the other interim responses are not
            if status.is_informational() && status != StatusCode::CONTINUE && status != StatusCode::SWITCHING_PROTOCOLS {
                debug!(status = %status, "skip informational response");
                continue;
            }

            head.extensions_mut().insert(self.exchange_id);
            debug!(exchange = self.exchange_id.get(), status = %status, "read response headers");
            return Ok(Some(head));
        }
    }

    fn open_response_body(&mut self, head: &ResponseHead) -> Result<ResponseBody, ParseError> {
        ensure!(
            head.extensions().get::<ExchangeId>() == Some(&self.exchange_id),
            ParseError::invalid_header("response head doesn't belong to the current exchange")
        );

        match response_payload_size(head, self.head_request)? {
            PayloadSize::Empty | PayloadSize::Length(0) => Ok(ResponseBody::empty()),
            payload_size => {
                self.reader.start_payload(payload_size)?;
                Ok(ResponseBody::stream(Http1Body::new(self.reader.clone(), payload_size)))
            }
        }
    }

    fn exchange_id(&self) -> ExchangeId {
        self.exchange_id
    }
}
