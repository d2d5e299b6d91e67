use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tracing::info;

use crate::connection::Handshake;

/// Wire protocol spoken on a connection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Protocol {
    Http10,
    Http11,
    /// HTTP/2 negotiated through ALPN
    H2,
    /// Cleartext HTTP/2 without an upgrade round trip
    H2PriorKnowledge,
}

impl Protocol {
    /// Whether several exchanges can share the connection at the same time.
    ///
    /// A multiplexed connection can leave an unsent request body behind on its own
    /// stream; a single-stream connection cannot.
    pub fn is_multiplexed(&self) -> bool {
        matches!(self, Protocol::H2 | Protocol::H2PriorKnowledge)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Protocol::Http10 => "http/1.0",
            Protocol::Http11 => "http/1.1",
            Protocol::H2 => "h2",
            Protocol::H2PriorKnowledge => "h2_prior_knowledge",
        };
        f.write_str(name)
    }
}

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// The state of an established connection that the exchange may read or change.
///
/// The only change the exchange makes is [`Connection::no_new_exchanges`]: once a
/// connection is retired it stays retired. The current exchange is never aborted by
/// it; the pool simply must not hand the connection out again.
#[derive(Debug)]
pub struct Connection {
    id: u64,
    protocol: Protocol,
    handshake: Option<Handshake>,
    no_new_exchanges: AtomicBool,
}

impl Connection {
    pub fn new(protocol: Protocol) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            protocol,
            handshake: None,
            no_new_exchanges: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn with_handshake(mut self, handshake: Handshake) -> Self {
        self.handshake = Some(handshake);
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn is_multiplexed(&self) -> bool {
        self.protocol.is_multiplexed()
    }

    pub fn handshake(&self) -> Option<&Handshake> {
        self.handshake.as_ref()
    }

    /// Prevents this connection from carrying any further exchange.
    ///
    /// Idempotent. Returns true only for the call that actually retired it.
    pub fn no_new_exchanges(&self) -> bool {
        let retired = !self.no_new_exchanges.swap(true, Ordering::AcqRel);
        if retired {
            info!(connection = self.id, protocol = %self.protocol, "connection retired, no new exchanges");
        }
        retired
    }

    pub fn is_reusable(&self) -> bool {
        !self.no_new_exchanges.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::TlsVersion;

    #[test]
    fn only_h2_is_multiplexed() {
        assert!(!Connection::new(Protocol::Http10).is_multiplexed());
        assert!(!Connection::new(Protocol::Http11).is_multiplexed());
        assert!(Connection::new(Protocol::H2).is_multiplexed());
        assert!(Connection::new(Protocol::H2PriorKnowledge).is_multiplexed());
    }

    #[test]
    fn retiring_is_monotonic() {
        let connection = Connection::new(Protocol::Http11);
        assert!(connection.is_reusable());

        assert!(connection.no_new_exchanges());
        assert!(!connection.is_reusable());

        assert!(!connection.no_new_exchanges());
        assert!(!connection.is_reusable());
    }

    #[test]
    fn handshake_is_exposed() {
        let connection = Connection::new(Protocol::H2).with_handshake(Handshake::new(TlsVersion::Tls13, "TLS_AES_128_GCM_SHA256"));
        let handshake = connection.handshake().unwrap();
        assert_eq!(handshake.tls_version(), TlsVersion::Tls13);
        assert_eq!(handshake.cipher_suite(), "TLS_AES_128_GCM_SHA256");
        assert!(Connection::new(Protocol::Http11).handshake().is_none());
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(Connection::new(Protocol::Http11).id(), Connection::new(Protocol::Http11).id());
    }
}
