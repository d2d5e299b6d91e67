//! Request head encoding and response head decoding.
//!
//! - [`HeaderEncoder`]: writes the request line and headers, fixing up `Host`
//!   and the body framing headers
//! - [`HeaderDecoder`]: parses the status line and headers of a response, with
//!   size and count limits

mod header_decoder;
mod header_encoder;

pub use header_decoder::{is_chunked, parse_content_length, HeaderDecoder};
pub use header_encoder::HeaderEncoder;
