//! Connection state visible to the exchange stage.
//!
//! Establishing, pooling and securing connections happens elsewhere. The exchange
//! only needs to know:
//!
//! - whether the connection is multiplexed ([`Protocol::is_multiplexed`])
//! - how to stop it from being reused ([`Connection::no_new_exchanges`])
//! - what TLS negotiated, if anything ([`Handshake`])

mod handshake;
mod state;

pub use handshake::{Handshake, TlsVersion};
pub use state::{Connection, Protocol};
