use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::protocol::ParseError;

/// The body attached to every response leaving the exchange.
///
/// Never absent: when there is nothing to read (for example after a protocol
/// upgrade) it is an empty body that has already ended.
pub struct ResponseBody {
    kind: Kind,
}

enum Kind {
    Empty,
    Stream(UnsyncBoxBody<Bytes, ParseError>),
}

impl ResponseBody {
    /// An empty body that reports zero length and is already at its end
    pub fn empty() -> Self {
        Self { kind: Kind::Empty }
    }

    pub fn full(bytes: Bytes) -> Self {
        Self::stream(Full::new(bytes).map_err(|never| match never {}))
    }

    pub fn stream<B>(body: B) -> Self
    where
        B: Body<Data = Bytes, Error = ParseError> + Send + 'static,
    {
        Self { kind: Kind::Stream(UnsyncBoxBody::new(body)) }
    }

    /// The exact body length when the framing declares one
    pub fn content_length(&self) -> Option<u64> {
        self.size_hint().exact()
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Empty => f.write_str("ResponseBody::Empty"),
            Kind::Stream(body) => f.debug_struct("ResponseBody::Stream").field("size_hint", &body.size_hint()).finish(),
        }
    }
}

impl Body for ResponseBody {
    type Data = Bytes;
    type Error = ParseError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match &mut self.get_mut().kind {
            Kind::Empty => Poll::Ready(None),
            Kind::Stream(body) => Pin::new(body).poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.kind {
            Kind::Empty => true,
            Kind::Stream(body) => body.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.kind {
            Kind::Empty => SizeHint::with_exact(0),
            Kind::Stream(body) => body.size_hint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_body_is_closed() {
        let mut body = ResponseBody::empty();
        assert!(body.is_end_stream());
        assert_eq!(body.content_length(), Some(0));
        assert!(body.frame().await.is_none());
    }

    #[tokio::test]
    async fn full_body_reports_length() {
        let body = ResponseBody::full(Bytes::from_static(b"hello"));
        assert_eq!(body.content_length(), Some(5));
        assert!(!body.is_end_stream());

        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"hello");
    }
}
