//! Sends one request and prints the response.
//!
//! ```sh
//! cargo run --example simple_get -- 127.0.0.1:8080 /
//! ```

use http::Request;
use http_body_util::BodyExt;
use micro_http_client::codec::Http1Codec;
use micro_http_client::connection::{Connection, Protocol};
use micro_http_client::exchange::{CallServer, ExchangeContext};
use micro_http_client::protocol::ResponseExt;
use micro_http_client::session::StaticSession;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut args = std::env::args().skip(1);
    let addr = args.next().unwrap_or_else(|| "127.0.0.1:8080".to_owned());
    let path = args.next().unwrap_or_else(|| "/".to_owned());

    let (reader, writer) = TcpStream::connect(&addr).await?.into_split();
    let mut codec = Http1Codec::new(reader, writer);
    let connection = Connection::new(Protocol::Http11);

    let server = CallServer::builder()
        .session_provider(Arc::new(StaticSession::new(
            http::HeaderName::from_static("x-session"),
            http::HeaderValue::from_static("demo"),
        )))
        .build();

    let request = Request::get(format!("http://{addr}{path}")).body(None)?;
    let response = server.execute(ExchangeContext::new(request, &mut codec, &connection)).await?;

    let elapsed = match (response.sent_request_at(), response.received_response_at()) {
        (Some(sent), Some(received)) => received.duration_since(sent).unwrap_or(Duration::ZERO),
        _ => Duration::ZERO,
    };
    info!(status = %response.status(), ?elapsed, reusable = connection.is_reusable(), "received response headers");

    let body = response.into_body().collect().await?.to_bytes();
    info!(len = body.len(), "received response body");
    println!("{}", String::from_utf8_lossy(&body));
    Ok(())
}
