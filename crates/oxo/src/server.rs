//! `OxoServer` accept loop: binds a listener and spawns one service-loop
//! task per connection, tying together transport → protocol → client.

use std::sync::Arc;

use oxo_client::ClientRegistry;
use oxo_player::PlayerRegistry;
use oxo_transport::{Transport, TcpConnection, TcpTransport};
use tokio::sync::watch;

use crate::service_loop::handle_connection;
use crate::ServerError;

/// A bound, not-yet-running oxo server.
pub struct OxoServer {
    transport: TcpTransport,
    registry: Arc<ClientRegistry<TcpConnection>>,
    players: Arc<PlayerRegistry>,
}

impl OxoServer {
    /// Binds to `addr` (e.g. `"0.0.0.0:3000"`).
    pub async fn bind(addr: &str) -> Result<Self, ServerError> {
        let transport = TcpTransport::bind(addr).await?;
        Ok(Self {
            transport,
            registry: Arc::new(ClientRegistry::new()),
            players: Arc::new(PlayerRegistry::new()),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// A handle to the live client registry, mainly useful for tests that
    /// want to observe connection counts without going through the wire.
    pub fn registry(&self) -> Arc<ClientRegistry<TcpConnection>> {
        Arc::clone(&self.registry)
    }

    /// Runs the accept loop until `shutdown` is signalled, then drains:
    /// stops accepting, shuts down every active connection's read side,
    /// and waits for the active-client count to reach zero before
    /// returning.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), ServerError> {
        tracing::info!("oxo server running");

        loop {
            tokio::select! {
                accepted = self.transport.accept() => {
                    match accepted {
                        Ok(conn) => {
                            let registry = Arc::clone(&self.registry);
                            let players = Arc::clone(&self.players);
                            tokio::spawn(async move {
                                if let Err(err) = handle_connection(conn, registry, players).await {
                                    tracing::debug!(error = %err, "connection ended with error");
                                }
                            });
                        }
                        Err(err) => {
                            tracing::error!(error = %err, "accept failed");
                        }
                    }
                }
                _ = shutdown.changed() => {
                    tracing::info!("shutdown signal received, closing accept loop");
                    break;
                }
            }
        }

        self.registry.shutdown_all().await;
        let registry = Arc::clone(&self.registry);
        let _ = tokio::task::spawn_blocking(move || registry.wait_for_empty()).await;
        tracing::info!("oxo server drained, exiting");
        Ok(())
    }
}
