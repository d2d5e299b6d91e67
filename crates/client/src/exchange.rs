//! The last stage of a call: one request out, one response back.
//!
//! [`CallServer::execute`] takes a fully assembled request and a codec bound to
//! an established connection and drives the exchange as an explicit state
//! machine:
//!
//! ```text
//! WriteHeaders -> DecideBody -+-----------------+-> WriteBody -+-> FinishRequest -> ReadHeaders -> Assemble -> OpenBody -> Done
//!                             |                 +-> OpenDuplex ----------------------^                ^   |
//!                             +-> AwaitContinue -+                                                     |   |
//!                                                +-> SkipBody -> FinishRequest -------------------------+   |
//!                                                                                 ReadHeaders <- (100) -----+
//! ```
//!
//! Besides returning the response, the exchange leaves the connection either
//! reusable or retired through [`Connection::no_new_exchanges`].

use std::sync::Arc;
use std::time::SystemTime;

use futures::SinkExt;
use http::header::CONNECTION;
use http::{Request, Response, StatusCode};
use tracing::{debug, trace, warn};

use crate::codec::ExchangeCodec;
use crate::connection::Connection;
use crate::event::{CallId, EventListener, ListenerResult, NoopListener};
use crate::protocol::body::{BufferedSink, CountingSink, DEFAULT_BUFFER_SIZE, RequestBody, ResponseBody};
use crate::protocol::{ExchangeInfo, HttpError, PayloadSize, RequestHeader, ResponseHead, header_eq_ignore_case};
use crate::session::SessionProvider;

static NOOP_LISTENER: NoopListener = NoopListener;

/// Executes request/response exchanges over an assigned connection.
///
/// Holds no per-exchange state and can be shared by every call of a client.
#[derive(Clone)]
pub struct CallServer {
    for_websocket: bool,
    body_buffer_size: usize,
    session_provider: Option<Arc<dyn SessionProvider>>,
}

impl CallServer {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> CallServerBuilder {
        CallServerBuilder::default()
    }

    pub fn for_websocket(&self) -> bool {
        self.for_websocket
    }

    pub fn body_buffer_size(&self) -> usize {
        self.body_buffer_size
    }
}

impl Default for CallServer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallServer")
            .field("for_websocket", &self.for_websocket)
            .field("body_buffer_size", &self.body_buffer_size)
            .field("session_provider", &self.session_provider.is_some())
            .finish()
    }
}

pub struct CallServerBuilder {
    for_websocket: bool,
    body_buffer_size: usize,
    session_provider: Option<Arc<dyn SessionProvider>>,
}

impl Default for CallServerBuilder {
    fn default() -> Self {
        Self { for_websocket: false, body_buffer_size: DEFAULT_BUFFER_SIZE, session_provider: None }
    }
}

impl std::fmt::Debug for CallServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallServerBuilder")
            .field("for_websocket", &self.for_websocket)
            .field("body_buffer_size", &self.body_buffer_size)
            .finish_non_exhaustive()
    }
}

impl CallServerBuilder {
    /// A `101 Switching Protocols` answer gets an empty body instead of a body
    /// reader; the connection now belongs to the upgraded protocol.
    pub fn for_websocket(mut self, for_websocket: bool) -> Self {
        self.for_websocket = for_websocket;
        self
    }

    /// How many request body bytes are coalesced before they reach the codec.
    pub fn body_buffer_size(mut self, body_buffer_size: usize) -> Self {
        self.body_buffer_size = body_buffer_size;
        self
    }

    pub fn session_provider(mut self, session_provider: Arc<dyn SessionProvider>) -> Self {
        self.session_provider = Some(session_provider);
        self
    }

    pub fn build(self) -> CallServer {
        CallServer {
            for_websocket: self.for_websocket,
            body_buffer_size: self.body_buffer_size,
            session_provider: self.session_provider,
        }
    }
}

/// Everything one exchange works with.
pub struct ExchangeContext<'a, C: ?Sized> {
    call: CallId,
    request: Request<Option<RequestBody>>,
    codec: &'a mut C,
    connection: &'a Connection,
    listener: &'a dyn EventListener,
}

impl<'a, C: ExchangeCodec + ?Sized> ExchangeContext<'a, C> {
    pub fn new(request: Request<Option<RequestBody>>, codec: &'a mut C, connection: &'a Connection) -> Self {
        Self { call: CallId::next(), request, codec, connection, listener: &NOOP_LISTENER }
    }

    #[must_use]
    pub fn with_listener(mut self, listener: &'a dyn EventListener) -> Self {
        self.listener = listener;
        self
    }

    #[must_use]
    pub fn with_call(mut self, call: CallId) -> Self {
        self.call = call;
        self
    }

    pub fn call(&self) -> CallId {
        self.call
    }
}

impl<C: ?Sized> std::fmt::Debug for ExchangeContext<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeContext").field("call", &self.call).field("request", &self.request).finish_non_exhaustive()
    }
}

/// Exchange states; each carries what the next step needs.
enum State {
    WriteHeaders,
    DecideBody,
    AwaitContinue,
    WriteBody,
    OpenDuplex,
    SkipBody(ResponseHead),
    FinishRequest(Option<ResponseHead>),
    ReadHeaders,
    Assemble(ResponseHead),
    OpenBody(ResponseHead),
    Done(Response<ResponseBody>),
}

impl CallServer {
    /// Sends the request in `ctx` and reads back its response.
    ///
    /// The response body is left unread. On error nothing is retried; the caller
    /// decides what happens to the call and the connection.
    pub async fn execute<C>(&self, ctx: ExchangeContext<'_, C>) -> Result<Response<ResponseBody>, HttpError>
    where
        C: ExchangeCodec + ?Sized,
    {
        let ExchangeContext { call, request, codec, connection, listener } = ctx;
        let (parts, body) = request.into_parts();

        let exchange = Exchange {
            server: self,
            call,
            request: Arc::new(RequestHeader::from(parts)),
            body,
            codec,
            connection,
            listener,
            sent_request_at: SystemTime::UNIX_EPOCH,
            duplex_open: false,
            continue_corrected: false,
        };
        exchange.run().await
    }
}

struct Exchange<'a, C: ?Sized> {
    server: &'a CallServer,
    call: CallId,
    request: Arc<RequestHeader>,
    body: Option<RequestBody>,
    codec: &'a mut C,
    connection: &'a Connection,
    listener: &'a dyn EventListener,
    sent_request_at: SystemTime,
    duplex_open: bool,
    continue_corrected: bool,
}

impl<C: ExchangeCodec + ?Sized> Exchange<'_, C> {
    async fn run(mut self) -> Result<Response<ResponseBody>, HttpError> {
        let mut state = State::WriteHeaders;
        loop {
            state = match state {
                State::WriteHeaders => self.write_headers().await?,
                State::DecideBody => self.decide_body(),
                State::AwaitContinue => self.await_continue().await?,
                State::WriteBody => self.write_body().await?,
                State::OpenDuplex => self.open_duplex().await?,
                State::SkipBody(head) => self.skip_body(head),
                State::FinishRequest(early_head) => self.finish_request(early_head).await?,
                State::ReadHeaders => self.read_headers().await?,
                State::Assemble(head) => self.assemble(head)?,
                State::OpenBody(head) => self.open_body(head)?,
                State::Done(response) => return self.done(response),
            };
        }
    }

    async fn write_headers(&mut self) -> Result<State, HttpError> {
        let payload_size = self.payload_size();
        let session = self.server.session_provider.as_ref().and_then(|provider| provider.session_header());

        self.sent_request_at = SystemTime::now();
        self.notify("request_headers_start", self.listener.request_headers_start(self.call));
        self.codec.write_request_headers(&self.request, payload_size, session.as_ref()).await?;
        self.notify("request_headers_end", self.listener.request_headers_end(self.call, &self.request));

        debug!(call = %self.call, method = %self.request.method(), uri = %self.request.uri(), "request headers written");
        Ok(State::DecideBody)
    }

    /// The framing of the body that will actually be sent.
    fn payload_size(&self) -> PayloadSize {
        match &self.body {
            Some(body) if self.request.permits_body() => {
                if body.is_duplex() {
                    return PayloadSize::Chunked;
                }
                match body.content_length() {
                    Some(length) => PayloadSize::Length(length),
                    None => PayloadSize::Chunked,
                }
            }
            _ => PayloadSize::Empty,
        }
    }

    fn decide_body(&mut self) -> State {
        let Some(body) = &self.body else {
            return State::FinishRequest(None);
        };

        if !self.request.permits_body() {
            debug!(call = %self.call, method = %self.request.method(), "method doesn't permit a body, body not sent");
            return State::FinishRequest(None);
        }

        if self.request.expects_continue() {
            State::AwaitContinue
        } else if body.is_duplex() {
            State::OpenDuplex
        } else {
            State::WriteBody
        }
    }

    async fn await_continue(&mut self) -> Result<State, HttpError> {
        self.codec.flush_request().await?;
        self.notify("response_headers_start", self.listener.response_headers_start(self.call));

        match self.codec.read_response_headers(true).await? {
            None => {
                trace!(call = %self.call, "server accepted the request body");
                let duplex = self.body.as_ref().is_some_and(RequestBody::is_duplex);
                Ok(if duplex { State::OpenDuplex } else { State::WriteBody })
            }
            Some(head) => Ok(State::SkipBody(head)),
        }
    }

    async fn write_body(&mut self) -> Result<State, HttpError> {
        let Some(body) = self.body.take() else {
            return Ok(State::FinishRequest(None));
        };

        self.notify("request_body_start", self.listener.request_body_start(self.call));
        let sink = self.codec.create_request_body(&self.request, body.content_length())?;
        let mut out = BufferedSink::with_capacity(CountingSink::new(sink), self.server.body_buffer_size);

        let result = match body.write_to(&mut out).await {
            Ok(()) => out.close().await,
            Err(e) => Err(e),
        };
        let byte_count = out.get_ref().successful_count();
        result?;

        self.notify("request_body_end", self.listener.request_body_end(self.call, byte_count));
        debug!(call = %self.call, byte_count, "request body written");
        Ok(State::FinishRequest(None))
    }

    async fn open_duplex(&mut self) -> Result<State, HttpError> {
        let Some(body) = self.body.take() else {
            return Ok(State::FinishRequest(None));
        };

        self.codec.flush_request().await?;
        let sink = self.codec.create_request_body(&self.request, None)?;
        let out = BufferedSink::with_capacity(CountingSink::new(sink), self.server.body_buffer_size);
        self.duplex_open = true;

        if body.hand_off(Box::pin(out)).is_err() {
            warn!(call = %self.call, "duplex body writer is gone, the request body will never end");
            if !self.connection.is_multiplexed() {
                self.connection.no_new_exchanges();
            }
        } else {
            debug!(call = %self.call, "duplex request body handed to its writer");
        }
        Ok(State::ReadHeaders)
    }

    fn skip_body(&mut self, head: ResponseHead) -> State {
        debug!(call = %self.call, status = %head.status(), "server answered before the request body, body not sent");
        self.body = None;
        if !self.connection.is_multiplexed() {
            self.connection.no_new_exchanges();
        }
        State::FinishRequest(Some(head))
    }

    /// Skipped only once a duplex body has been handed to its writer, which then
    /// owns the end of the request. A duplex body that never got that far is
    /// finished like any other.
    async fn finish_request(&mut self, early_head: Option<ResponseHead>) -> Result<State, HttpError> {
        if !self.duplex_open {
            self.codec.finish_request().await?;
        }

        Ok(match early_head {
            Some(head) => State::Assemble(head),
            None => State::ReadHeaders,
        })
    }

    async fn read_headers(&mut self) -> Result<State, HttpError> {
        if !self.continue_corrected {
            self.notify("response_headers_start", self.listener.response_headers_start(self.call));
        }

        match self.codec.read_response_headers(false).await? {
            Some(head) => Ok(State::Assemble(head)),
            None => Err(HttpError::protocol_violation("codec reported an interim response to a strict read")),
        }
    }

    fn assemble(&mut self, mut head: ResponseHead) -> Result<State, HttpError> {
        let info = ExchangeInfo::new(
            Arc::clone(&self.request),
            self.connection.handshake().cloned(),
            self.sent_request_at,
            SystemTime::now(),
        );
        head.extensions_mut().insert(info);
        head.extensions_mut().insert(self.codec.exchange_id());

        if head.status() == StatusCode::CONTINUE {
            if self.continue_corrected {
                return Err(HttpError::protocol_violation("received a second unsolicited 100 continue"));
            }
            debug!(call = %self.call, "unsolicited 100 continue, reading the final response");
            self.continue_corrected = true;
            return Ok(State::ReadHeaders);
        }

        self.notify("response_headers_end", self.listener.response_headers_end(self.call, &head));
        Ok(State::OpenBody(head))
    }

    fn open_body(&mut self, head: ResponseHead) -> Result<State, HttpError> {
        let body = if self.server.for_websocket && head.status() == StatusCode::SWITCHING_PROTOCOLS {
            trace!(call = %self.call, "protocol upgrade, response body left empty");
            ResponseBody::empty()
        } else {
            self.codec.open_response_body(&head)?
        };

        Ok(State::Done(head.map(|()| body)))
    }

    fn done(self, response: Response<ResponseBody>) -> Result<Response<ResponseBody>, HttpError> {
        if self.request.wants_close() || header_eq_ignore_case(response.headers().get(CONNECTION), "close") {
            self.connection.no_new_exchanges();
        }

        let status = response.status();
        if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
            if let Some(length) = response.body().content_length().filter(|length| *length > 0) {
                return Err(HttpError::protocol_violation(format!("HTTP {} had non-zero Content-Length: {length}", status.as_u16())));
            }
        }

        debug!(call = %self.call, status = %status, "exchange done");
        Ok(response)
    }

    fn notify(&self, event: &'static str, result: ListenerResult) {
        if let Err(e) = result {
            warn!(call = %self.call, event, cause = %e, "event listener failed");
        }
    }
}
