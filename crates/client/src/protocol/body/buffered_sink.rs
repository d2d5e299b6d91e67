use bytes::{Bytes, BytesMut};
use futures::{Sink, ready};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Default number of bytes coalesced before they are handed to the delegate
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

pin_project! {
    /// Coalesces small body writes into chunks of up to `capacity` bytes.
    ///
    /// Closing the sink forwards whatever is still buffered and then closes the
    /// delegate, which is how a body writer signals that it is done.
    #[derive(Debug)]
    pub struct BufferedSink<S> {
        #[pin]
        inner: S,
        buffer: BytesMut,
        capacity: usize,
    }
}

impl<S> BufferedSink<S> {
    pub fn new(inner: S) -> Self {
        Self::with_capacity(inner, DEFAULT_BUFFER_SIZE)
    }

    pub fn with_capacity(inner: S, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { inner, buffer: BytesMut::with_capacity(capacity), capacity }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Sink<Bytes>> BufferedSink<S> {
    /// Hands the buffered bytes to the delegate as one chunk.
    fn poll_drain(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), S::Error>> {
        let mut this = self.project();
        if this.buffer.is_empty() {
            return Poll::Ready(Ok(()));
        }

        ready!(this.inner.as_mut().poll_ready(cx))?;
        let chunk = this.buffer.split().freeze();
        this.inner.start_send(chunk)?;
        Poll::Ready(Ok(()))
    }
}

impl<S: Sink<Bytes>> Sink<Bytes> for BufferedSink<S> {
    type Error = S::Error;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        if self.buffer.len() < self.capacity {
            return Poll::Ready(Ok(()));
        }
        self.poll_drain(cx)
    }

    fn start_send(self: Pin<&mut Self>, item: Bytes) -> Result<(), Self::Error> {
        self.project().buffer.extend_from_slice(&item);
        Ok(())
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        ready!(self.as_mut().poll_drain(cx))?;
        self.project().inner.poll_flush(cx)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        ready!(self.as_mut().poll_drain(cx))?;
        self.project().inner.poll_close(cx)
    }
}
