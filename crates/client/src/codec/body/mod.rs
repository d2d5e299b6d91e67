//! Body framing for HTTP/1.x.
//!
//! Request bodies go out through a [`PayloadEncoder`] (`Content-Length` or chunked),
//! response bodies come in through a [`PayloadDecoder`], which additionally knows
//! how to read a body delimited by the end of the connection.

mod chunked_decoder;
mod chunked_encoder;
mod length_decoder;
mod length_encoder;
mod payload_decoder;
mod payload_encoder;

pub use payload_decoder::PayloadDecoder;
pub use payload_encoder::PayloadEncoder;
