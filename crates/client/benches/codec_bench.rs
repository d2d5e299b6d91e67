use bytes::BytesMut;
use criterion::{Criterion, criterion_group, criterion_main};
use futures::executor::block_on;
use http::Request;
use http_body_util::BodyExt;
use micro_http_client::codec::{Http1Codec, RequestEncoder, ResponseDecoder};
use micro_http_client::connection::{Connection, Protocol};
use micro_http_client::exchange::{CallServer, ExchangeContext};
use micro_http_client::protocol::body::RequestBody;
use micro_http_client::protocol::{Message, PayloadSize, RequestHeader};
use std::hint::black_box;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_util::codec::{Decoder, Encoder};

const RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nServer: bench\r\nContent-Length: 12\r\n\r\nHello World!";

// Serves a canned response and swallows everything written
struct MockIO {
    read_data: &'static [u8],
    read_pos: usize,
}

impl MockIO {
    fn new(read_data: &'static [u8]) -> Self {
        Self { read_data, read_pos: 0 }
    }
}

impl AsyncRead for MockIO {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let remaining = &self.read_data[self.read_pos..];
        let amt = std::cmp::min(remaining.len(), buf.remaining());
        buf.put_slice(&remaining[..amt]);
        self.read_pos += amt;
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockIO {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize, io::Error>> {
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }
}

fn bench_response_decoder(c: &mut Criterion) {
    c.bench_function("decode_simple_response", |b| {
        b.iter(|| {
            let mut decoder = ResponseDecoder::new();
            let mut bytes = BytesMut::from(RESPONSE);
            black_box(decoder.decode(&mut bytes).unwrap());
        });
    });
}

fn bench_request_encoder(c: &mut Criterion) {
    c.bench_function("encode_simple_request", |b| {
        b.iter(|| {
            let mut encoder = RequestEncoder::new();
            let mut bytes = BytesMut::new();
            let request = RequestHeader::from(Request::get("http://localhost/index.html").body(()).unwrap());
            let message = Message::<_>::Header((request, PayloadSize::Empty));
            encoder.encode(message, &mut bytes).unwrap();
            black_box(bytes);
        });
    });
}

fn bench_exchange(c: &mut Criterion) {
    let server = CallServer::new();

    c.bench_function("execute_simple_exchange", |b| {
        b.iter(|| {
            let mut codec = Http1Codec::new(MockIO::new(RESPONSE), MockIO::new(b""));
            let connection = Connection::new(Protocol::Http11);
            let request = Request::post("http://localhost/echo").body(Some(RequestBody::from("ping"))).unwrap();

            let bytes = block_on(async {
                let response = server.execute(ExchangeContext::new(request, &mut codec, &connection)).await.unwrap();
                response.into_body().collect().await.unwrap().to_bytes()
            });
            black_box(bytes);
        });
    });
}

criterion_group!(benches, bench_response_decoder, bench_request_encoder, bench_exchange);
criterion_main!(benches);
