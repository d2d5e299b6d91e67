use std::future::poll_fn;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use futures::{Sink, Stream};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::codec::{RequestEncoder, ResponseDecoder};
use crate::protocol::{Message, ParseError, PayloadSize, RequestHeader, ResponseHead, SendError};

pub(crate) type OutMessage = Message<(RequestHeader, PayloadSize)>;
pub(crate) type InMessage = Message<ResponseHead>;

/// Write half of a connection, shared by the codec and the request body sink.
///
/// The lock is only taken inside a single poll, never across an await.
pub(crate) struct SharedWriter<W> {
    inner: Arc<Mutex<FramedWrite<W, RequestEncoder>>>,
}

impl<W> Clone for SharedWriter<W> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<W: AsyncWrite + Unpin> SharedWriter<W> {
    pub(crate) fn new(writer: W) -> Self {
        Self { inner: Arc::new(Mutex::new(FramedWrite::new(writer, RequestEncoder::new()))) }
    }

    fn lock(&self) -> Result<MutexGuard<'_, FramedWrite<W, RequestEncoder>>, SendError> {
        self.inner.lock().map_err(|_| SendError::io(io::Error::other("request writer lock poisoned")))
    }

    pub(crate) fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), SendError>> {
        let mut framed = self.lock()?;
        Sink::<OutMessage>::poll_ready(Pin::new(&mut *framed), cx)
    }

    pub(crate) fn start_send(&self, item: OutMessage) -> Result<(), SendError> {
        let mut framed = self.lock()?;
        Sink::<OutMessage>::start_send(Pin::new(&mut *framed), item)
    }

    pub(crate) fn poll_flush(&self, cx: &mut Context<'_>) -> Poll<Result<(), SendError>> {
        let mut framed = self.lock()?;
        Sink::<OutMessage>::poll_flush(Pin::new(&mut *framed), cx)
    }

    /// Encodes `item` into the write buffer, flushing first only if the buffer is full
    pub(crate) async fn feed(&self, item: OutMessage) -> Result<(), SendError> {
        poll_fn(|cx| self.poll_ready(cx)).await?;
        self.start_send(item)
    }

    pub(crate) async fn flush(&self) -> Result<(), SendError> {
        poll_fn(|cx| self.poll_flush(cx)).await
    }

    pub(crate) fn is_in_body(&self) -> Result<bool, SendError> {
        Ok(self.lock()?.encoder().is_in_body())
    }

    pub(crate) fn abandon_body(&self) -> Result<bool, SendError> {
        Ok(self.lock()?.encoder_mut().abandon_body())
    }
}

/// Read half of a connection, shared by the codec and the response body.
pub(crate) struct SharedReader<R> {
    inner: Arc<Mutex<FramedRead<R, ResponseDecoder>>>,
}

impl<R> Clone for SharedReader<R> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<R: AsyncRead + Unpin> SharedReader<R> {
    pub(crate) fn with_capacity(reader: R, capacity: usize) -> Self {
        Self { inner: Arc::new(Mutex::new(FramedRead::with_capacity(reader, ResponseDecoder::new(), capacity))) }
    }

    fn lock(&self) -> Result<MutexGuard<'_, FramedRead<R, ResponseDecoder>>, ParseError> {
        self.inner.lock().map_err(|_| ParseError::io(io::Error::other("response reader lock poisoned")))
    }

    pub(crate) fn poll_next(&self, cx: &mut Context<'_>) -> Poll<Option<Result<InMessage, ParseError>>> {
        match self.lock() {
            Ok(mut framed) => Pin::new(&mut *framed).poll_next(cx),
            Err(e) => Poll::Ready(Some(Err(e))),
        }
    }

    pub(crate) async fn next(&self) -> Option<Result<InMessage, ParseError>> {
        poll_fn(|cx| self.poll_next(cx)).await
    }

    pub(crate) fn start_payload(&self, payload_size: PayloadSize) -> Result<(), ParseError> {
        self.lock()?.decoder_mut().start_payload(payload_size);
        Ok(())
    }

    pub(crate) fn is_in_body(&self) -> Result<bool, ParseError> {
        Ok(self.lock()?.decoder().is_in_body())
    }
}
