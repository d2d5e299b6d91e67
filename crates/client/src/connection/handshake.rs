use bytes::Bytes;

/// TLS version negotiated for a connection.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TlsVersion {
    Tls12,
    Tls13,
}

/// What the TLS layer negotiated when the connection was established.
///
/// Produced by whoever performed the handshake; the exchange only copies it onto
/// the responses it builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    tls_version: TlsVersion,
    cipher_suite: String,
    peer_certificates: Vec<Bytes>,
    local_certificates: Vec<Bytes>,
}

impl Handshake {
    pub fn new<S: Into<String>>(tls_version: TlsVersion, cipher_suite: S) -> Self {
        Self { tls_version, cipher_suite: cipher_suite.into(), peer_certificates: Vec::new(), local_certificates: Vec::new() }
    }

    /// DER encoded certificates presented by the server, leaf first
    #[must_use]
    pub fn with_peer_certificates(mut self, certificates: Vec<Bytes>) -> Self {
        self.peer_certificates = certificates;
        self
    }

    /// DER encoded certificates this side presented, leaf first
    #[must_use]
    pub fn with_local_certificates(mut self, certificates: Vec<Bytes>) -> Self {
        self.local_certificates = certificates;
        self
    }

    pub fn tls_version(&self) -> TlsVersion {
        self.tls_version
    }

    pub fn cipher_suite(&self) -> &str {
        &self.cipher_suite
    }

    pub fn peer_certificates(&self) -> &[Bytes] {
        &self.peer_certificates
    }

    pub fn local_certificates(&self) -> &[Bytes] {
        &self.local_certificates
    }
}
