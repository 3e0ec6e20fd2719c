//! TCP transport: the one realization of [`Transport`]/[`Connection`].

use std::net::Shutdown;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Listens for and accepts raw TCP connections.
///
/// The spec treats bind/listen as an external collaborator; only the
/// accept loop contract matters here, so [`bind`](Self::bind) is a thin
/// wrapper and the interesting behavior is in [`accept`](Transport::accept).
pub struct TcpTransport {
    listener: TcpListener,
    next_id: AtomicU64,
}

impl TcpTransport {
    /// Binds a listening socket at `addr`.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        Ok(Self {
            listener,
            next_id: AtomicU64::new(1),
        })
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;

    async fn accept(&mut self) -> Result<Self::Connection, TransportError> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        stream.set_nodelay(true).ok();
        let id = ConnectionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (read_half, write_half) = stream.into_split();
        Ok(TcpConnection {
            id,
            read: Mutex::new(read_half),
            write: Mutex::new(write_half),
        })
    }

    fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }
}

/// A single accepted TCP connection, split into independently lockable
/// read and write halves.
///
/// The write half is guarded so that a notification sent by another
/// worker (e.g. the counterpart of an accepted invitation) cannot
/// interleave its bytes with this connection's own outbound packet — the
/// per-Client "socket lock" the spec's concurrency model requires. Only
/// the owning worker ever reads, but the read half is still behind a
/// `Mutex` so `shutdown_read` can reach the socket from another task
/// during shutdown without requiring `&mut self`.
pub struct TcpConnection {
    id: ConnectionId,
    read: Mutex<OwnedReadHalf>,
    write: Mutex<OwnedWriteHalf>,
}

impl Connection for TcpConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut write = self.write.lock().await;
        write
            .write_all(data)
            .await
            .map_err(TransportError::SendFailed)
    }

    async fn recv_exact(&self, buf: &mut [u8]) -> Result<bool, TransportError> {
        if buf.is_empty() {
            return Ok(true);
        }
        let mut read = self.read.lock().await;
        // Read the first byte by hand so a clean close before any bytes
        // arrive is distinguishable from end-of-stream mid-packet.
        let n = read
            .read(&mut buf[..1])
            .await
            .map_err(TransportError::ReceiveFailed)?;
        if n == 0 {
            return Ok(false);
        }
        if buf.len() > 1 {
            read.read_exact(&mut buf[1..])
                .await
                .map_err(TransportError::ReceiveFailed)?;
        }
        Ok(true)
    }

    async fn shutdown_read(&self) -> Result<(), TransportError> {
        let read = self.read.lock().await;
        match read.as_ref().shutdown(Shutdown::Read) {
            Ok(()) => Ok(()),
            // Already closed by the peer — not an error for our purposes.
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(TransportError::ReceiveFailed(e)),
        }
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
