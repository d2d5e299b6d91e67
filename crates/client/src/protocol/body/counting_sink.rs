use bytes::Bytes;
use futures::Sink;
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};

pin_project! {
    /// A pass-through sink that counts the bytes its delegate accepted.
    ///
    /// The count only grows after the delegate's `start_send` returned `Ok`, so a
    /// failed chunk is never counted. It is read once the body has been written and
    /// only feeds observers.
    #[derive(Debug)]
    pub struct CountingSink<S> {
        #[pin]
        inner: S,
        successful_count: u64,
    }
}

impl<S> CountingSink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, successful_count: 0 }
    }

    /// Total bytes forwarded to the delegate without error
    pub fn successful_count(&self) -> u64 {
        self.successful_count
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Sink<Bytes>> Sink<Bytes> for CountingSink<S> {
    type Error = S::Error;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_ready(cx)
    }

    fn start_send(self: Pin<&mut Self>, item: Bytes) -> Result<(), Self::Error> {
        let this = self.project();
        let len = item.len() as u64;
        this.inner.start_send(item)?;
        *this.successful_count += len;
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_flush(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_close(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SendError;
    use futures::SinkExt;
    use std::io;

    /// Accepts `accept` chunks, then fails every following write.
    struct FailAfter {
        accept: usize,
        written: Vec<Bytes>,
    }

    impl Sink<Bytes> for FailAfter {
        type Error = SendError;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn start_send(self: Pin<&mut Self>, item: Bytes) -> Result<(), Self::Error> {
            let this = self.get_mut();
            if this.written.len() == this.accept {
                return Err(SendError::io(io::Error::from(io::ErrorKind::BrokenPipe)));
            }
            this.written.push(item);
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn counts_every_accepted_chunk() {
        let mut sink = CountingSink::new(FailAfter { accept: usize::MAX, written: vec![] });

        sink.feed(Bytes::from_static(b"hello")).await.unwrap();
        sink.feed(Bytes::from_static(b", ")).await.unwrap();
        sink.send(Bytes::from_static(b"world")).await.unwrap();

        assert_eq!(sink.successful_count(), 12);
        assert_eq!(sink.into_inner().written.len(), 3);
    }

    #[tokio::test]
    async fn failed_chunk_is_not_counted() {
        let mut sink = CountingSink::new(FailAfter { accept: 2, written: vec![] });

        sink.feed(Bytes::from_static(b"1234")).await.unwrap();
        sink.feed(Bytes::from_static(b"567")).await.unwrap();
        let result = sink.feed(Bytes::from_static(b"89abcdef")).await;

        assert!(matches!(result, Err(SendError::Io { .. })));
        assert_eq!(sink.successful_count(), 7);

        // a later failure does not disturb the count either
        assert!(sink.feed(Bytes::from_static(b"x")).await.is_err());
        assert_eq!(sink.successful_count(), 7);
    }

    #[tokio::test]
    async fn empty_chunks_count_nothing() {
        let mut sink = CountingSink::new(FailAfter { accept: usize::MAX, written: vec![] });
        sink.feed(Bytes::new()).await.unwrap();
        assert_eq!(sink.successful_count(), 0);
    }
}
