use crate::protocol::{PayloadItem, SendError};
use bytes::{Buf, BytesMut};
use tokio_util::codec::Encoder;

/// Writes a request body announced with `Content-Length`.
///
/// The body must match the announced length exactly: extra bytes are rejected
/// when they arrive, missing bytes when the end marker arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthEncoder {
    length: u64,
    remaining: u64,
    eof: bool,
}

impl LengthEncoder {
    pub fn new(length: u64) -> Self {
        Self { length, remaining: length, eof: false }
    }

    pub fn is_finish(&self) -> bool {
        self.eof
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for LengthEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            return Err(SendError::invalid_body("request body already finished"));
        }

        match item {
            PayloadItem::Chunk(mut bytes) => {
                let size = bytes.remaining() as u64;
                if size > self.remaining {
                    return Err(SendError::length_mismatch(self.length, self.length - self.remaining + size));
                }

                dst.reserve(bytes.remaining());
                while bytes.has_remaining() {
                    let chunk = bytes.chunk();
                    let len = chunk.len();
                    dst.extend_from_slice(chunk);
                    bytes.advance(len);
                }
                self.remaining -= size;
                Ok(())
            }
            PayloadItem::Eof => {
                self.eof = true;
                if self.remaining > 0 {
                    return Err(SendError::length_mismatch(self.length, self.length - self.remaining));
                }
                Ok(())
            }
        }
    }
}
