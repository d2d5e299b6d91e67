//! The terminal exchange stage of an asynchronous HTTP client.
//!
//! By the time a call reaches this crate, everything before the wire is done:
//! the request is fully assembled, a connection has been picked and a codec is
//! bound to it. [`exchange::CallServer`] then performs exactly one exchange:
//!
//! - writes the request headers, plus an optional session header
//! - handles `Expect: 100-continue`, skipping the body when the server answers
//!   early
//! - streams the request body, or hands a duplex body to its writer
//! - reads the response headers, reading past a single unsolicited `100`
//! - opens the response body, or leaves it empty for a websocket upgrade
//! - retires the connection when either side asked for `Connection: close`
//!
//! Progress is reported to an [`event::EventListener`].
//!
//! # Example
//!
//! ```no_run
//! use http::Request;
//! use http_body_util::BodyExt;
//! use micro_http_client::codec::Http1Codec;
//! use micro_http_client::connection::{Connection, Protocol};
//! use micro_http_client::exchange::{CallServer, ExchangeContext};
//! use micro_http_client::protocol::body::RequestBody;
//! use tokio::net::TcpStream;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let (reader, writer) = TcpStream::connect("127.0.0.1:8080").await?.into_split();
//! let mut codec = Http1Codec::new(reader, writer);
//! let connection = Connection::new(Protocol::Http11);
//!
//! let request = Request::post("http://127.0.0.1:8080/echo").body(Some(RequestBody::from("hello")))?;
//! let response = CallServer::new().execute(ExchangeContext::new(request, &mut codec, &connection)).await?;
//!
//! let (head, body) = response.into_parts();
//! let bytes = body.collect().await?.to_bytes();
//! println!("{} {} bytes", head.status, bytes.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`exchange`]: the exchange state machine
//! - [`codec`]: the [`codec::ExchangeCodec`] seam and its HTTP/1.x implementation
//! - [`protocol`]: request/response heads, bodies, framing and errors
//! - [`connection`]: the connection handle an exchange runs on
//! - [`event`]: exchange observers
//! - [`session`]: per-client session headers
//!
//! # Errors
//!
//! - [`protocol::HttpError`]: everything [`exchange::CallServer::execute`] returns
//! - [`protocol::SendError`]: failures writing the request
//! - [`protocol::ParseError`]: failures reading the response
//!
//! # Limitations
//!
//! - Only an HTTP/1.x codec ships with the crate; multiplexed protocols plug in
//!   through [`codec::ExchangeCodec`]
//! - Maximum response header size: 8KB
//! - Maximum number of response headers: 64

pub mod codec;
pub mod connection;
pub mod event;
pub mod exchange;
pub mod protocol;
pub mod session;

mod utils;
pub(crate) use utils::ensure;
