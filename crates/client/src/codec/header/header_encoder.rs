//! Serializes a request head into HTTP/1.x wire format.
//!
//! The request line uses origin form (`GET /path?query HTTP/1.1`), authority form
//! for `CONNECT`. A missing `Host` header is filled from the request URI, and the
//! framing headers are rewritten to match the [`PayloadSize`] the body will be
//! sent with:
//!
//! | payload size | written headers                                         |
//! |--------------|---------------------------------------------------------|
//! | `Length(n)`  | `Content-Length: n`, no `Transfer-Encoding`             |
//! | `Chunked`    | `Transfer-Encoding: chunked`, no `Content-Length`       |
//! | `Empty`      | `Content-Length: 0` when the method permits a body      |

use crate::protocol::{PayloadSize, RequestHeader, SendError};

use bytes::{BufMut, BytesMut};

use http::{header, HeaderValue, Method, Version};
use std::io;
use std::io::{ErrorKind, Write};
use tokio_util::codec::Encoder;
use tracing::error;

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

const CHUNKED: HeaderValue = HeaderValue::from_static("chunked");
const ZERO: HeaderValue = HeaderValue::from_static("0");

/// Encoder for request heads.
pub struct HeaderEncoder;

impl Encoder<(RequestHeader, PayloadSize)> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, item: (RequestHeader, PayloadSize), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (header, payload_size) = item;
        let permits_body = header.permits_body();
        let mut request = header.into_inner();

        let version = match request.version() {
            Version::HTTP_11 => "HTTP/1.1",
            Version::HTTP_10 => "HTTP/1.0",
            v => {
                error!(http_version = ?v, "unsupported http version");
                return Err(io::Error::from(ErrorKind::Unsupported).into());
            }
        };

        let uri = request.uri();
        let target = if request.method() == Method::CONNECT {
            uri.authority().map(|authority| authority.as_str()).unwrap_or("/")
        } else {
            uri.path_and_query().map(|path| path.as_str()).unwrap_or("/")
        };

        dst.reserve(INIT_HEADER_SIZE);
        write!(FastWrite(dst), "{} {} {}\r\n", request.method().as_str(), target, version)?;

        if !request.headers().contains_key(header::HOST) {
            if let Some(authority) = request.uri().authority() {
                let host = HeaderValue::from_str(authority.as_str()).map_err(|e| io::Error::new(ErrorKind::InvalidInput, e))?;
                request.headers_mut().insert(header::HOST, host);
            }
        }

        let headers = request.headers_mut();
        match payload_size {
            PayloadSize::Length(n) => {
                headers.remove(header::TRANSFER_ENCODING);
                headers.insert(header::CONTENT_LENGTH, n.into());
            }
            PayloadSize::Chunked => {
                headers.remove(header::CONTENT_LENGTH);
                headers.insert(header::TRANSFER_ENCODING, CHUNKED);
            }
            PayloadSize::Empty => {
                headers.remove(header::TRANSFER_ENCODING);
                if permits_body {
                    headers.insert(header::CONTENT_LENGTH, ZERO);
                } else {
                    headers.remove(header::CONTENT_LENGTH);
                }
            }
            PayloadSize::UntilClose => {
                return Err(io::Error::new(ErrorKind::InvalidInput, "a request body can't be delimited by close").into());
            }
        }

        for (header_name, header_value) in request.headers().iter() {
            dst.put_slice(header_name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(header_value.as_ref());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// Writes straight into the reserved buffer.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
