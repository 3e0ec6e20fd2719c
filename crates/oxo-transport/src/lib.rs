//! Transport abstraction layer.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the raw byte stream a connection is built on. The only implementation
//! is [`TcpTransport`]/[`TcpConnection`] over `tokio::net`; the traits
//! exist so the framing logic in `oxo-protocol` is not hard-wired to TCP.

#![allow(async_fn_in_trait)]

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::{TcpConnection, TcpTransport};

use std::fmt;

/// Opaque identifier for a connection, assigned in accept order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, TransportError>;

    /// Returns the address this transport is bound to.
    fn local_addr(&self) -> std::io::Result<std::net::SocketAddr>;
}

/// A single connection that moves bytes to and from one peer.
///
/// These are deliberately low-level: `oxo-protocol` builds packet framing
/// (header + payload, full-read/full-write semantics) on top of them.
/// [`send`](Connection::send) internally serializes concurrent writers so
/// that a multi-packet notification is never interleaved with another
/// writer's bytes on the same connection — this is the "socket lock" of
/// the concurrency model.
pub trait Connection: Send + Sync + 'static {
    /// Writes the entire buffer to the peer, retrying partial writes.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Reads exactly `buf.len()` bytes, retrying partial reads.
    ///
    /// Returns `Ok(false)` if the very first byte of `buf` could not be
    /// read because the peer closed the connection cleanly (end of
    /// stream at a packet boundary). Any other end-of-stream, after at
    /// least one byte has already been consumed, is a
    /// [`TransportError::ReceiveFailed`] — the spec treats a closed
    /// connection mid-header or mid-payload as a failure, not a clean
    /// close.
    async fn recv_exact(&self, buf: &mut [u8]) -> Result<bool, TransportError>;

    /// Shuts down the read half, causing a blocked or future `recv_exact`
    /// to observe end-of-stream. Used to unblock workers during shutdown.
    async fn shutdown_read(&self) -> Result<(), TransportError>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_equality() {
        let a = ConnectionId::new(1);
        let b = ConnectionId::new(1);
        let c = ConnectionId::new(2);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_connection_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnectionId::new(1), "alice");
        map.insert(ConnectionId::new(2), "bob");
        assert_eq!(map[&ConnectionId::new(1)], "alice");
    }
}
