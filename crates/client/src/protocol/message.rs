use bytes::{Buf, Bytes};

/// A unit flowing through the request encoder or the response decoder.
///
/// `T` is the head type: `(RequestHeader, PayloadSize)` on the way out,
/// [`ResponseHead`](crate::protocol::ResponseHead) on the way in.
#[derive(Debug)]
pub enum Message<T, Data: Buf = Bytes> {
    /// The message head
    Header(T),
    /// A chunk of the message body or its end marker
    Payload(PayloadItem<Data>),
}

/// One item of a message body stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf = Bytes> {
    /// A chunk of body data
    Chunk(Data),
    /// Marks the end of the body
    Eof,
}

/// How a message body is delimited on the wire.
///
/// Requests only ever use `Length`, `Chunked` and `Empty`. `UntilClose` is the
/// response framing used when the server sends neither `Content-Length` nor
/// `Transfer-Encoding: chunked`: the body runs until the peer closes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Body with a known length in bytes
    Length(u64),
    /// Body using chunked transfer encoding
    Chunked,
    /// Body terminated by the peer closing the connection
    UntilClose,
    /// No body at all
    Empty,
}

impl PayloadSize {
    /// The exact number of body bytes, when the framing declares one.
    ///
    /// `Empty` reports `Some(0)`; chunked and close-delimited bodies are unknown.
    pub fn content_length(&self) -> Option<u64> {
        match self {
            PayloadSize::Length(length) => Some(*length),
            PayloadSize::Empty => Some(0),
            PayloadSize::Chunked | PayloadSize::UntilClose => None,
        }
    }
}

impl<T> Message<T> {
    /// Returns true if this message carries a head
    #[inline]
    pub fn is_header(&self) -> bool {
        matches!(self, Message::Header(_))
    }
}

impl<T> From<Bytes> for Message<T> {
    fn from(bytes: Bytes) -> Self {
        Self::Payload(PayloadItem::Chunk(bytes))
    }
}

impl<D: Buf> PayloadItem<D> {
    /// Returns true if this item marks the end of the body
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }

    /// Returns true if this item carries data
    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, PayloadItem::Chunk(_))
    }
}

impl PayloadItem {
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }

    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_length_follows_framing() {
        assert_eq!(PayloadSize::Length(10).content_length(), Some(10));
        assert_eq!(PayloadSize::Empty.content_length(), Some(0));
        assert_eq!(PayloadSize::Chunked.content_length(), None);
        assert_eq!(PayloadSize::UntilClose.content_length(), None);
    }
}
