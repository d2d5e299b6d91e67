use std::fmt;
use std::fmt::Display;
use std::pin::Pin;

use bytes::Bytes;
use futures::channel::oneshot;
use futures::stream::BoxStream;
use futures::{Sink, SinkExt, Stream, StreamExt, TryStreamExt};
use http_body::Body;
use http_body_util::BodyExt;

use crate::protocol::SendError;

/// The sink a request body is written into.
///
/// Obtained from the codec; closing it marks the end of the request body.
pub type BodySink = Pin<Box<dyn Sink<Bytes, Error = SendError> + Send>>;

/// The body of an outgoing request.
///
/// Ordinary bodies are written in full by the exchange before it reads the
/// response. A duplex body is handed to its [`DuplexWriter`] instead, and the
/// application keeps writing while the response is being read.
pub struct RequestBody {
    kind: Kind,
}

enum Kind {
    Full(Bytes),
    Stream { content_length: Option<u64>, stream: BoxStream<'static, Result<Bytes, SendError>> },
    Duplex(oneshot::Sender<BodySink>),
}

impl RequestBody {
    pub fn empty() -> Self {
        Self { kind: Kind::Full(Bytes::new()) }
    }

    pub fn full<B: Into<Bytes>>(bytes: B) -> Self {
        Self { kind: Kind::Full(bytes.into()) }
    }

    /// A body produced chunk by chunk; `content_length` is `None` when unknown.
    pub fn stream<S>(content_length: Option<u64>, stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, SendError>> + Send + 'static,
    {
        Self { kind: Kind::Stream { content_length, stream: stream.boxed() } }
    }

    /// Adapts any `http_body::Body`; its exact size hint becomes the content length.
    pub fn from_body<B>(body: B) -> Self
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Display,
    {
        let content_length = body.size_hint().exact();
        let stream = body.into_data_stream().map_err(|e| SendError::invalid_body(format!("read request body error: {e}")));
        Self::stream(content_length, stream)
    }

    /// A body whose sink is delivered to the returned writer once headers are sent.
    pub fn duplex() -> (Self, DuplexWriter) {
        let (sender, receiver) = oneshot::channel();
        (Self { kind: Kind::Duplex(sender) }, DuplexWriter { receiver })
    }

    /// The declared body length, `None` when unknown
    pub fn content_length(&self) -> Option<u64> {
        match &self.kind {
            Kind::Full(bytes) => Some(bytes.len() as u64),
            Kind::Stream { content_length, .. } => *content_length,
            Kind::Duplex(_) => None,
        }
    }

    pub fn is_duplex(&self) -> bool {
        matches!(self.kind, Kind::Duplex(_))
    }

    /// Writes the whole body into `sink` without closing it.
    pub async fn write_to<S>(self, sink: &mut S) -> Result<(), SendError>
    where
        S: Sink<Bytes, Error = SendError> + Unpin,
    {
        match self.kind {
            Kind::Full(bytes) => {
                if !bytes.is_empty() {
                    sink.feed(bytes).await?;
                }
                Ok(())
            }
            Kind::Stream { mut stream, .. } => {
                while let Some(chunk) = stream.try_next().await? {
                    if !chunk.is_empty() {
                        sink.feed(chunk).await?;
                    }
                }
                Ok(())
            }
            Kind::Duplex(_) => Err(SendError::invalid_body("duplex body can only be written through its DuplexWriter")),
        }
    }

    /// Passes the sink to the duplex writer. Gives the sink back if this body
    /// is not duplex or its writer is gone.
    pub(crate) fn hand_off(self, sink: BodySink) -> Result<(), BodySink> {
        match self.kind {
            Kind::Duplex(sender) => sender.send(sink),
            _ => Err(sink),
        }
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Full(bytes) => f.debug_tuple("Full").field(&bytes.len()).finish(),
            Kind::Stream { content_length, .. } => f.debug_struct("Stream").field("content_length", content_length).finish(),
            Kind::Duplex(_) => f.write_str("Duplex"),
        }
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        Self::full(bytes)
    }
}

impl From<String> for RequestBody {
    fn from(value: String) -> Self {
        Self::full(value)
    }
}

impl From<&'static str> for RequestBody {
    fn from(value: &'static str) -> Self {
        Self::full(value)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(value: Vec<u8>) -> Self {
        Self::full(value)
    }
}

/// The application side of a duplex request body.
#[derive(Debug)]
pub struct DuplexWriter {
    receiver: oneshot::Receiver<BodySink>,
}

impl DuplexWriter {
    /// Waits until the exchange has sent the request headers and opened the body.
    ///
    /// Close the returned sink to end the request body.
    pub async fn sink(self) -> Result<BodySink, SendError> {
        self.receiver.await.map_err(|_canceled| SendError::invalid_body("exchange ended before the duplex body was opened"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;
    use futures::stream;
    use http_body_util::Full;

    fn collecting_sink() -> (impl Sink<Bytes, Error = SendError> + Unpin, mpsc::UnboundedReceiver<Bytes>) {
        let (sender, receiver) = mpsc::unbounded::<Bytes>();
        (sender.sink_map_err(|e| SendError::invalid_body(e)), receiver)
    }

    #[tokio::test]
    async fn full_body_writes_once() {
        let (mut sink, receiver) = collecting_sink();
        let body = RequestBody::full("0123456789");
        assert_eq!(body.content_length(), Some(10));

        body.write_to(&mut sink).await.unwrap();
        sink.close().await.unwrap();

        let chunks: Vec<Bytes> = receiver.collect().await;
        assert_eq!(chunks, vec![Bytes::from_static(b"0123456789")]);
    }

    #[tokio::test]
    async fn stream_body_stops_at_first_error() {
        let (mut sink, receiver) = collecting_sink();
        let chunks = vec![Ok(Bytes::from_static(b"abc")), Err(SendError::invalid_body("boom")), Ok(Bytes::from_static(b"def"))];
        let body = RequestBody::stream(None, stream::iter(chunks));
        assert_eq!(body.content_length(), None);

        let result = body.write_to(&mut sink).await;
        assert!(matches!(result, Err(SendError::InvalidBody { .. })));
        sink.close().await.unwrap();

        let written: Vec<Bytes> = receiver.collect().await;
        assert_eq!(written, vec![Bytes::from_static(b"abc")]);
    }

    #[tokio::test]
    async fn http_body_keeps_exact_size() {
        let body = RequestBody::from_body(Full::new(Bytes::from_static(b"hello")));
        assert_eq!(body.content_length(), Some(5));
        assert!(!body.is_duplex());
    }

    #[tokio::test]
    async fn duplex_body_hands_off_sink() {
        let (body, writer) = RequestBody::duplex();
        assert!(body.is_duplex());
        assert_eq!(body.content_length(), None);

        let (sink, receiver) = collecting_sink();
        assert!(body.hand_off(Box::pin(sink)).is_ok());

        let mut sink = writer.sink().await.unwrap();
        sink.send(Bytes::from_static(b"late")).await.unwrap();
        sink.close().await.unwrap();

        let written: Vec<Bytes> = receiver.collect().await;
        assert_eq!(written, vec![Bytes::from_static(b"late")]);
    }

    #[tokio::test]
    async fn dropped_exchange_fails_duplex_writer() {
        let (body, writer) = RequestBody::duplex();
        drop(body);
        assert!(writer.sink().await.is_err());
    }
}
