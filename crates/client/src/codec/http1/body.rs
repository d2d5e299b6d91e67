use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use futures::Sink;
use http_body::{Body, Frame, SizeHint};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::trace;

use crate::codec::http1::shared::{SharedReader, SharedWriter};
use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize, SendError};

/// Request body sink over an HTTP/1.x write half.
///
/// Every chunk is framed by the payload encoder chosen when the headers were
/// written. Closing sends the end marker (`0\r\n\r\n` for chunked bodies, a length
/// check for fixed ones) and flushes.
pub struct Http1BodySink<W> {
    writer: SharedWriter<W>,
    eof_queued: bool,
}

impl<W> Http1BodySink<W> {
    pub(crate) fn new(writer: SharedWriter<W>) -> Self {
        Self { writer, eof_queued: false }
    }
}

impl<W: AsyncWrite + Unpin> Sink<Bytes> for Http1BodySink<W> {
    type Error = SendError;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        if self.eof_queued {
            return Poll::Ready(Err(SendError::invalid_body("request body already closed")));
        }
        self.writer.poll_ready(cx)
    }

    fn start_send(self: Pin<&mut Self>, item: Bytes) -> Result<(), Self::Error> {
        self.writer.start_send(Message::Payload(PayloadItem::Chunk(item)))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.writer.poll_flush(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        let this = self.get_mut();
        if !this.eof_queued {
            ready!(this.writer.poll_ready(cx))?;
            this.writer.start_send(Message::Payload(PayloadItem::Eof))?;
            this.eof_queued = true;
            trace!("request body end queued");
        }
        this.writer.poll_flush(cx)
    }
}

/// Response body read from an HTTP/1.x read half.
pub struct Http1Body<R> {
    reader: SharedReader<R>,
    payload_size: PayloadSize,
    received: u64,
    finished: bool,
}

impl<R> Http1Body<R> {
    pub(crate) fn new(reader: SharedReader<R>, payload_size: PayloadSize) -> Self {
        Self { reader, payload_size, received: 0, finished: false }
    }
}

impl<R: AsyncRead + Unpin> Body for Http1Body<R> {
    type Data = Bytes;
    type Error = ParseError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        let result = match ready!(this.reader.poll_next(cx)) {
            Some(Ok(Message::Payload(PayloadItem::Chunk(bytes)))) => {
                this.received += bytes.len() as u64;
                return Poll::Ready(Some(Ok(Frame::data(bytes))));
            }
            Some(Ok(Message::Payload(PayloadItem::Eof))) => {
                trace!(received = this.received, "response body finished");
                None
            }
            Some(Ok(Message::Header(_))) => Some(Err(ParseError::invalid_body("response head inside a response body"))),
            Some(Err(e)) => Some(Err(e)),
            None => Some(Err(ParseError::unexpected_eof("connection closed before the response body was complete"))),
        };

        this.finished = true;
        Poll::Ready(result)
    }

    fn is_end_stream(&self) -> bool {
        self.finished
    }

    fn size_hint(&self) -> SizeHint {
        match self.payload_size {
            PayloadSize::Length(length) => SizeHint::with_exact(length.saturating_sub(self.received)),
            PayloadSize::Empty => SizeHint::with_exact(0),
            PayloadSize::Chunked | PayloadSize::UntilClose => SizeHint::default(),
        }
    }
}
