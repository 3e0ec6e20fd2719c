//! Per-connection service loop: register, dispatch packets, clean up.
//!
//! Each accepted connection gets its own Tokio task running this loop.

use std::sync::Arc;

use oxo_client::{Client, ClientRegistry};
use oxo_player::PlayerRegistry;
use oxo_protocol::{recv_packet, Header, PacketType};
use oxo_transport::Connection;

use crate::ServerError;

/// Drop guard that logs a client out and unregisters it when the service
/// loop for its connection exits, including on panic. `logout`/
/// `unregister` are async/need the registry lock, so the actual work is
/// handed off to a detached task — `Drop` itself stays synchronous.
struct ClientGuard<C: Connection> {
    client: Arc<Client<C>>,
    registry: Arc<ClientRegistry<C>>,
}

impl<C: Connection> Drop for ClientGuard<C> {
    fn drop(&mut self) {
        let client = Arc::clone(&self.client);
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            client.logout().await;
            registry.unregister(&client);
        });
    }
}

/// Handles a single connection from registration to disconnect.
pub(crate) async fn handle_connection<C: Connection>(
    conn: C,
    registry: Arc<ClientRegistry<C>>,
    players: Arc<PlayerRegistry>,
) -> Result<(), ServerError> {
    let client = match registry.register(conn) {
        Some(client) => client,
        None => {
            tracing::warn!("client registry full, dropping connection");
            return Ok(());
        }
    };
    let conn_id = client.id();
    tracing::debug!(%conn_id, "client connected");

    let _guard = ClientGuard {
        client: Arc::clone(&client),
        registry: Arc::clone(&registry),
    };

    loop {
        let (header, payload) = match recv_packet(client.connection()).await {
            Ok(Some(pair)) => pair,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(err) => {
                tracing::debug!(%conn_id, error = %err, "recv failed, terminating session");
                break;
            }
        };

        if let Err(err) = dispatch(&client, &registry, &players, header, payload).await {
            tracing::debug!(%conn_id, error = %err, "send failed, terminating session");
            break;
        }
    }

    Ok(())
}

/// Routes one received packet to the matching `Client` operation and
/// replies with ACK or NACK. Only a send/recv I/O failure propagates —
/// everything else becomes a NACK and the loop continues.
async fn dispatch<C: Connection>(
    client: &Arc<Client<C>>,
    registry: &ClientRegistry<C>,
    players: &PlayerRegistry,
    header: Header,
    payload: Vec<u8>,
) -> Result<(), oxo_protocol::ProtocolError> {
    if !client.is_logged_in() && header.packet_type != PacketType::Login {
        return client.send_nack().await;
    }

    match header.packet_type {
        PacketType::Login => {
            if client.is_logged_in() {
                return client.send_nack().await;
            }
            let name = String::from_utf8_lossy(&payload).into_owned();
            match players.login_or_create(&name) {
                Ok(player) => match client.login(player, registry) {
                    Ok(()) => client.send_ack(&[]).await,
                    Err(_) => client.send_nack().await,
                },
                Err(_) => client.send_nack().await,
            }
        }

        PacketType::Users => {
            let mut listing = String::new();
            for player in registry.active_players() {
                listing.push_str(&format!("{}\t{}\n", player.name(), player.rating()));
            }
            client.send_ack(listing.as_bytes()).await
        }

        PacketType::Invite => {
            let target_role = header.role;
            let source_role = target_role.opposite();
            let target_name = String::from_utf8_lossy(&payload).into_owned();
            match registry.lookup(&target_name) {
                Some(target) => match client
                    .make_invitation(&target, source_role, target_role)
                    .await
                {
                    Ok(source_slot) => client.send_ack_with_id(source_slot as u8, &[]).await,
                    Err(_) => client.send_nack().await,
                },
                None => client.send_nack().await,
            }
        }

        PacketType::Revoke => match client.revoke(header.id as usize).await {
            Ok(()) => client.send_ack(&[]).await,
            Err(_) => client.send_nack().await,
        },

        PacketType::Decline => match client.decline(header.id as usize).await {
            Ok(()) => client.send_ack(&[]).await,
            Err(_) => client.send_nack().await,
        },

        PacketType::Accept => match client.accept(header.id as usize).await {
            Ok(Some(board)) => client.send_ack(board.as_bytes()).await,
            Ok(None) => client.send_ack(&[]).await,
            Err(_) => client.send_nack().await,
        },

        PacketType::Move => {
            let text = String::from_utf8_lossy(&payload).into_owned();
            match client.make_move(header.id as usize, &text).await {
                Ok(()) => client.send_ack(&[]).await,
                Err(_) => client.send_nack().await,
            }
        }

        PacketType::Resign => match client.resign(header.id as usize).await {
            Ok(()) => client.send_ack(&[]).await,
            Err(_) => client.send_nack().await,
        },

        PacketType::None | PacketType::Ack | PacketType::Nack | PacketType::Invited
        | PacketType::Revoked | PacketType::Accepted | PacketType::Declined
        | PacketType::Moved | PacketType::Resigned | PacketType::Ended => {
            client.send_nack().await
        }
    }
}
