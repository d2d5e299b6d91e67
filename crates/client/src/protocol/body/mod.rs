//! Request and response bodies as the exchange sees them.
//!
//! - [`RequestBody`]: what the application sends, either written in full by the
//!   exchange or, for a duplex body, written later through a [`DuplexWriter`]
//! - [`BodySink`]: the codec-provided sink a request body is written into
//! - [`CountingSink`] and [`BufferedSink`]: the wrappers the exchange puts
//!   around that sink to report progress and coalesce small writes
//! - [`ResponseBody`]: what the application reads, never absent

mod buffered_sink;
mod counting_sink;
mod request_body;
mod response_body;

pub use buffered_sink::{BufferedSink, DEFAULT_BUFFER_SIZE};
pub use counting_sink::CountingSink;
pub use request_body::{BodySink, DuplexWriter, RequestBody};
pub use response_body::ResponseBody;
