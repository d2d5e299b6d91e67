//! Streaming decoder for responses.
//!
//! Unlike a request, a response does not describe its own body: whether it has
//! one depends on the request method and the status code as well. So after a
//! head is decoded, [`ResponseDecoder`] reads nothing further until the codec
//! calls [`ResponseDecoder::start_payload`] with the framing it settled on.

use crate::codec::body::PayloadDecoder;
use crate::codec::header::HeaderDecoder;
use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize, ResponseHead};
use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::trace;

/// Decodes response heads and, once started, the body that follows.
///
/// The decoder keeps its state in `payload_decoder`:
/// - `None`: the next bytes are a response head
/// - `Some(PayloadDecoder)`: the next bytes are body
pub struct ResponseDecoder {
    header_decoder: HeaderDecoder,
    payload_decoder: Option<PayloadDecoder>,
}

impl ResponseDecoder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Switches the decoder to reading a body with the given framing.
    pub fn start_payload(&mut self, payload_size: PayloadSize) {
        trace!(?payload_size, "start reading response body");
        self.payload_decoder = Some(payload_size.into());
    }

    pub fn is_in_body(&self) -> bool {
        self.payload_decoder.is_some()
    }
}

impl Default for ResponseDecoder {
    fn default() -> Self {
        Self { header_decoder: HeaderDecoder, payload_decoder: None }
    }
}

impl Decoder for ResponseDecoder {
    type Item = Message<ResponseHead>;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let message = match payload_decoder.decode(src)? {
                Some(item @ PayloadItem::Chunk(_)) => Some(Message::Payload(item)),
                Some(item @ PayloadItem::Eof) => {
                    self.payload_decoder.take();
                    Some(Message::Payload(item))
                }
                None => None,
            };

            return Ok(message);
        }

        Ok(self.header_decoder.decode(src)?.map(Message::Header))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let until_close = self.payload_decoder.as_ref().is_some_and(PayloadDecoder::is_until_close);
        if until_close {
            if !src.is_empty() {
                return Ok(Some(Message::Payload(PayloadItem::Chunk(src.split().freeze()))));
            }
            trace!("connection closed, response body finished");
            self.payload_decoder.take();
            return Ok(Some(Message::Payload(PayloadItem::Eof)));
        }

        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if src.is_empty() && self.payload_decoder.is_none() => Ok(None),
            None if self.payload_decoder.is_some() => Err(ParseError::unexpected_eof("connection closed before the response body was complete")),
            None => Err(ParseError::unexpected_eof("connection closed inside a response head")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use indoc::indoc;

    fn body_bytes(message: Message<ResponseHead>) -> bytes::Bytes {
        match message {
            Message::Payload(item) => item.into_bytes().unwrap(),
            Message::Header(_) => panic!("expected body bytes"),
        }
    }

    fn is_eof(message: &Message<ResponseHead>) -> bool {
        matches!(message, Message::Payload(PayloadItem::Eof))
    }

    #[test]
    fn head_then_fixed_body() {
        let str = indoc! {r##"
        HTTP/1.1 200 OK
        Content-Length: 5

        helloHTTP/1.1"##};
        let mut buf = BytesMut::from(str);
        let mut decoder = ResponseDecoder::new();

        let Message::Header(head) = decoder.decode(&mut buf).unwrap().unwrap() else { panic!("expected head") };
        assert_eq!(head.status(), StatusCode::OK);
        assert!(!decoder.is_in_body());

        decoder.start_payload(PayloadSize::Length(5));
        assert_eq!(body_bytes(decoder.decode(&mut buf).unwrap().unwrap()).as_ref(), b"hello");
        assert!(is_eof(&decoder.decode(&mut buf).unwrap().unwrap()));
        assert!(!decoder.is_in_body());
        assert_eq!(&buf[..], b"HTTP/1.1");
    }

    #[test]
    fn body_is_not_read_before_start() {
        let mut buf = BytesMut::from("HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok");
        let mut decoder = ResponseDecoder::new();

        assert!(decoder.decode(&mut buf).unwrap().unwrap().is_header());
        assert_eq!(&buf[..], b"ok");
    }

    #[test]
    fn until_close_body_ends_at_eof() {
        let mut buf = BytesMut::from("HTTP/1.0 200 OK\r\n\r\nstream");
        let mut decoder = ResponseDecoder::new();

        assert!(decoder.decode(&mut buf).unwrap().unwrap().is_header());
        decoder.start_payload(PayloadSize::UntilClose);

        assert_eq!(body_bytes(decoder.decode(&mut buf).unwrap().unwrap()).as_ref(), b"stream");
        assert!(decoder.decode(&mut buf).unwrap().is_none());

        assert!(is_eof(&decoder.decode_eof(&mut buf).unwrap().unwrap()));
        assert!(decoder.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn truncated_body_is_an_error() {
        let mut buf = BytesMut::from("HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nshort");
        let mut decoder = ResponseDecoder::new();

        assert!(decoder.decode(&mut buf).unwrap().unwrap().is_header());
        decoder.start_payload(PayloadSize::Length(10));
        assert_eq!(body_bytes(decoder.decode(&mut buf).unwrap().unwrap()).as_ref(), b"short");

        assert!(decoder.decode_eof(&mut buf).is_err());
    }

    #[test]
    fn truncated_head_is_an_error_but_clean_eof_is_not() {
        let mut decoder = ResponseDecoder::new();
        assert!(decoder.decode_eof(&mut BytesMut::new()).unwrap().is_none());

        let mut buf = BytesMut::from("HTTP/1.1 200 OK\r\nContent-");
        assert!(decoder.decode_eof(&mut buf).is_err());
    }
}
