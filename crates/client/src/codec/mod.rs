//! Wire codecs.
//!
//! [`ExchangeCodec`] is the seam between the exchange state machine and the
//! bytes on a connection. [`Http1Codec`] implements it for HTTP/1.x on top of
//! `tokio_util` framing:
//!
//! - Request side: [`RequestEncoder`] writes the head through the
//!   [`header`] encoder and the body through the [`body`] payload encoders
//! - Response side: [`ResponseDecoder`] parses the head and, once the framing
//!   is known, the body
//!
//! # Example
//!
//! ```no_run
//! use micro_http_client::codec::{ExchangeCodec, Http1Codec};
//! use micro_http_client::protocol::{PayloadSize, RequestHeader};
//! use tokio::net::TcpStream;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let (reader, writer) = TcpStream::connect("127.0.0.1:8080").await?.into_split();
//! let mut codec = Http1Codec::new(reader, writer);
//!
//! let request = RequestHeader::from(http::Request::get("http://127.0.0.1:8080/").body(())?);
//! codec.write_request_headers(&request, PayloadSize::Empty, None).await?;
//! codec.finish_request().await?;
//!
//! if let Some(head) = codec.read_response_headers(false).await? {
//!     let body = codec.open_response_body(&head)?;
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::protocol::body::{BodySink, ResponseBody};
use crate::protocol::{ExchangeId, ParseError, PayloadSize, RequestHeader, ResponseHead, SendError};
use crate::session::SessionHeader;

mod body;
mod header;
mod http1;
mod request_encoder;
mod response_decoder;

pub use http1::{Http1Body, Http1BodySink, Http1Codec, DEFAULT_READ_CAPACITY};
pub use request_encoder::RequestEncoder;
pub use response_decoder::ResponseDecoder;

/// Moves one request onto the wire and one response off it.
///
/// Calls arrive in exchange order: headers, an optional body sink, finish, then
/// one or two header reads and finally the body. A codec is free to treat any
/// other order as an error.
#[async_trait]
pub trait ExchangeCodec: Send {
    /// Writes the request line and headers.
    ///
    /// `payload_size` is the framing of the body that will follow; the codec
    /// rewrites the framing headers to match it. A session header, if given,
    /// goes out with the other headers.
    async fn write_request_headers(
        &mut self,
        request: &RequestHeader,
        payload_size: PayloadSize,
        session: Option<&SessionHeader>,
    ) -> Result<(), SendError>;

    /// Pushes buffered request bytes to the peer.
    async fn flush_request(&mut self) -> Result<(), SendError>;

    /// The sink for the request body; closing it ends the body.
    ///
    /// `content_length` is `None` for bodies of unknown length.
    fn create_request_body(&mut self, request: &RequestHeader, content_length: Option<u64>) -> Result<BodySink, SendError>;

    /// Marks the request as fully written.
    async fn finish_request(&mut self) -> Result<(), SendError>;

    /// Reads the next response head.
    ///
    /// With `expect_continue` set, a `100 Continue` yields `Ok(None)`.
    /// Without it, every head is returned as is.
    async fn read_response_headers(&mut self, expect_continue: bool) -> Result<Option<ResponseHead>, ParseError>;

    /// A reader for the body belonging to `head`.
    fn open_response_body(&mut self, head: &ResponseHead) -> Result<ResponseBody, ParseError>;

    /// The exchange the codec is currently carrying.
    fn exchange_id(&self) -> ExchangeId;
}
