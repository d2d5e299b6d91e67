//! Core HTTP protocol types used by the exchange stage.
//!
//! - **Message handling** ([`Message`], [`PayloadItem`], [`PayloadSize`]): the
//!   units the codec encodes and decodes, and how a body is delimited
//! - **Request heads** ([`RequestHeader`]): the request with its body split off,
//!   plus the checks the exchange makes on it
//! - **Response heads** ([`ResponseHead`], [`ExchangeInfo`], [`ResponseExt`]):
//!   the response before its body is attached and the metadata stamped on it
//! - **Bodies** ([`body`]): request and response bodies and the sink wrappers
//! - **Errors** ([`HttpError`], [`ParseError`], [`SendError`])

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod request;
pub use request::RequestHeader;
pub(crate) use request::header_eq_ignore_case;

mod response;
pub use response::ExchangeId;
pub use response::ExchangeInfo;
pub use response::ResponseExt;
pub use response::ResponseHead;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;

pub mod body;
