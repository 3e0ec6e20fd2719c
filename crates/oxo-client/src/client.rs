//! Per-connection client state: the logged-in player (if any) and the
//! invitation slot table.
//!
//! There is no explicit reference-count lock here — `Arc`'s own atomic
//! strong count already serializes increments/decrements, so adding a
//! `Mutex` around it would only protect a count nothing else reads. There
//! is also no separate socket-send lock: `Connection::send` serializes
//! concurrent writers (see `oxo-transport`), and every multi-packet
//! notification here goes out through `oxo_protocol::send_packets`, which
//! assembles the whole sequence into one buffer before calling `send` —
//! so the lock is held for the entire sequence, not reacquired per
//! packet.

use std::sync::{Arc, Mutex};

use oxo_match::Invitation;
use oxo_player::{post_result, Outcome, Player};
use oxo_protocol::{send_packet, send_packets, send_simple, Header, PacketType, Role};
use oxo_transport::{Connection, ConnectionId};

use crate::error::ClientError;
use crate::registry::ClientRegistry;

/// Upper bound on how many invitations a single client can have open or
/// active at once.
const MAX_INVITATIONS: usize = 64;

/// One live connection's worth of server-side state.
///
/// Generic over the transport `Connection` so tests can swap in anything
/// that implements the trait; production wiring uses
/// `oxo_transport::TcpConnection`.
pub struct Client<C: Connection> {
    conn: C,
    player: Mutex<Option<Arc<Player>>>,
    invitations: Mutex<Vec<Option<Arc<Invitation<Client<C>>>>>>,
}

impl<C: Connection> Client<C> {
    pub fn new(conn: C) -> Arc<Self> {
        Arc::new(Self {
            conn,
            player: Mutex::new(None),
            invitations: Mutex::new(Vec::new()),
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.conn.id()
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    pub fn player(&self) -> Option<Arc<Player>> {
        self.player.lock().unwrap().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.player.lock().unwrap().is_some()
    }

    /// Logs this connection in as `player`. Fails if this connection is
    /// already logged in, or if another active client is already logged
    /// in under the same player.
    pub fn login(
        self: &Arc<Self>,
        player: Arc<Player>,
        registry: &ClientRegistry<C>,
    ) -> Result<(), ClientError> {
        let mut slot = self.player.lock().unwrap();
        if slot.is_some() {
            return Err(ClientError::DuplicateLogin);
        }
        if registry.is_player_active(&player, self) {
            return Err(ClientError::Name(format!(
                "{} is already logged in",
                player.name()
            )));
        }
        *slot = Some(player);
        Ok(())
    }

    /// Tears down every outstanding invitation (resigning accepted games,
    /// revoking or declining pending ones) and clears the player slot.
    /// Safe to call on a client that was never logged in.
    pub async fn logout(self: &Arc<Self>) {
        let pending: Vec<Arc<Invitation<Client<C>>>> = {
            let table = self.invitations.lock().unwrap();
            table.iter().flatten().cloned().collect()
        };

        for invitation in pending {
            if let Some(slot_id) = self.slot_of(&invitation) {
                match invitation.state() {
                    oxo_match::InvitationState::Accepted => {
                        let _ = self.resign(slot_id).await;
                    }
                    oxo_match::InvitationState::Open => {
                        if Arc::ptr_eq(invitation.source(), self) {
                            let _ = self.revoke(slot_id).await;
                        } else {
                            let _ = self.decline(slot_id).await;
                        }
                    }
                    oxo_match::InvitationState::Closed => {
                        self.remove_invitation(&invitation);
                    }
                }
            }
        }

        *self.player.lock().unwrap() = None;
    }

    pub async fn send_ack(&self, payload: &[u8]) -> Result<(), oxo_protocol::ProtocolError> {
        self.send_ack_with_id(0, payload).await
    }

    /// Same as [`send_ack`](Self::send_ack), but with an explicit
    /// `header.id` — needed for replies where the caller must learn a
    /// slot id it didn't already know (e.g. the source-side slot an
    /// INVITE was assigned).
    pub async fn send_ack_with_id(
        &self,
        id: u8,
        payload: &[u8],
    ) -> Result<(), oxo_protocol::ProtocolError> {
        let header = Header::new(PacketType::Ack, id, Role::Null, payload.len() as u16);
        send_packet(&self.conn, header, payload).await
    }

    pub async fn send_nack(&self) -> Result<(), oxo_protocol::ProtocolError> {
        send_simple(&self.conn, PacketType::Nack, &[]).await
    }

    /// Creates an OPEN invitation from this client to `target`, inserts it
    /// into both slot tables, and notifies `target` with an INVITED
    /// packet. Returns this client's own slot id for the invitation.
    pub async fn make_invitation(
        self: &Arc<Self>,
        target: &Arc<Self>,
        source_role: Role,
        target_role: Role,
    ) -> Result<usize, ClientError> {
        let invitation =
            Invitation::create(Arc::clone(self), source_role, Arc::clone(target), target_role)?;

        let source_slot = self.insert_invitation(Arc::clone(&invitation))?;
        let target_slot = match target.insert_invitation(Arc::clone(&invitation)) {
            Ok(slot) => slot,
            Err(err) => {
                self.remove_invitation(&invitation);
                return Err(err);
            }
        };

        let source_name = self
            .player()
            .map(|p| p.name().to_string())
            .unwrap_or_default();
        let header = Header::new(
            PacketType::Invited,
            target_slot as u8,
            target_role,
            source_name.len() as u16,
        );
        if send_packet(&target.conn, header, source_name.as_bytes())
            .await
            .is_err()
        {
            tracing::debug!(target = %target.id(), "failed to deliver INVITED notification");
        }

        Ok(source_slot)
    }

    /// Source-side cancellation of a still-OPEN invitation.
    pub async fn revoke(self: &Arc<Self>, slot_id: usize) -> Result<(), ClientError> {
        let invitation = self.invitation_at(slot_id)?;
        if !Arc::ptr_eq(invitation.source(), self) {
            return Err(ClientError::State("not the source of this invitation".into()));
        }
        invitation.close_pending()?;

        let target = Arc::clone(invitation.target());
        let target_slot = target.slot_of(&invitation);
        self.remove_invitation(&invitation);
        target.remove_invitation(&invitation);

        if let Some(target_slot) = target_slot {
            let header = Header::new(PacketType::Revoked, target_slot as u8, Role::Null, 0);
            let _ = send_packet(&target.conn, header, &[]).await;
        }
        Ok(())
    }

    /// Target-side rejection of a still-OPEN invitation.
    pub async fn decline(self: &Arc<Self>, slot_id: usize) -> Result<(), ClientError> {
        let invitation = self.invitation_at(slot_id)?;
        if !Arc::ptr_eq(invitation.target(), self) {
            return Err(ClientError::State("not the target of this invitation".into()));
        }
        invitation.close_pending()?;

        let source = Arc::clone(invitation.source());
        let source_slot = source.slot_of(&invitation);
        self.remove_invitation(&invitation);
        source.remove_invitation(&invitation);

        if let Some(source_slot) = source_slot {
            let header = Header::new(PacketType::Declined, source_slot as u8, Role::Null, 0);
            let _ = send_packet(&source.conn, header, &[]).await;
        }
        Ok(())
    }

    /// Target-side acceptance. Starts the game and notifies the source
    /// with an ACCEPTED packet. If the acting client (the target) moves
    /// first, the rendered initial board is returned so the caller can
    /// deliver it as the ACK payload; otherwise the board already went to
    /// the source in the ACCEPTED payload and `None` is returned.
    pub async fn accept(self: &Arc<Self>, slot_id: usize) -> Result<Option<String>, ClientError> {
        let invitation = self.invitation_at(slot_id)?;
        if !Arc::ptr_eq(invitation.target(), self) {
            return Err(ClientError::State("not the target of this invitation".into()));
        }
        let game = invitation.accept()?;
        let board_text = game.unparse_state();

        let source = invitation.source();
        let source_slot = source.slot_of(&invitation).unwrap_or(0);

        if invitation.source_role() == Role::First {
            let header = Header::new(
                PacketType::Accepted,
                source_slot as u8,
                Role::Null,
                board_text.len() as u16,
            );
            let _ = send_packet(&source.conn, header, board_text.as_bytes()).await;
            Ok(None)
        } else {
            let header = Header::new(PacketType::Accepted, source_slot as u8, Role::Null, 0);
            let _ = send_packet(&source.conn, header, &[]).await;
            Ok(Some(board_text))
        }
    }

    /// Resigns an ACCEPTED game, closing the invitation with the
    /// opponent as winner, notifying both sides, and posting the rating
    /// update.
    pub async fn resign(self: &Arc<Self>, slot_id: usize) -> Result<(), ClientError> {
        let invitation = self.invitation_at(slot_id)?;
        let my_role = invitation
            .role_of(self)
            .ok_or_else(|| ClientError::State("not a participant in this invitation".into()))?;
        let winner = invitation.resign(my_role)?;

        let opponent = self.opponent_in(&invitation)?;
        let opponent_slot = opponent.slot_of(&invitation);
        self.remove_invitation(&invitation);
        opponent.remove_invitation(&invitation);

        if let Some(opponent_slot) = opponent_slot {
            let resigned = Header::new(PacketType::Resigned, opponent_slot as u8, Role::Null, 0);
            let ended = Header::new(PacketType::Ended, opponent_slot as u8, winner, 0);
            let _ = send_packets(&opponent.conn, &[(resigned, &[] as &[u8]), (ended, &[])]).await;
        }
        let header = Header::new(PacketType::Ended, slot_id as u8, winner, 0);
        let _ = send_packet(&self.conn, header, &[]).await;

        self.post_outcome(&invitation, winner);
        Ok(())
    }

    /// Applies a move to an ACCEPTED game's turn for this client's role.
    /// Notifies the opponent with the new board; if the move ended the
    /// game, also notifies both with ENDED, tears down the invitation,
    /// and posts the rating update.
    pub async fn make_move(self: &Arc<Self>, slot_id: usize, text: &str) -> Result<(), ClientError> {
        let invitation = self.invitation_at(slot_id)?;
        let my_role = invitation
            .role_of(self)
            .ok_or_else(|| ClientError::State("not a participant in this invitation".into()))?;
        let game = invitation
            .game()
            .ok_or_else(|| ClientError::State("invitation is not accepted".into()))?;

        let mv = game.parse_move(my_role, text)?;
        let outcome = game.apply_move(mv)?;

        let opponent = self.opponent_in(&invitation)?;
        let opponent_slot = opponent.slot_of(&invitation);
        let board_text = game.unparse_state();

        if outcome.terminated {
            invitation.close_finished()?;
            self.remove_invitation(&invitation);
            opponent.remove_invitation(&invitation);

            if let Some(opponent_slot) = opponent_slot {
                let moved = Header::new(
                    PacketType::Moved,
                    opponent_slot as u8,
                    Role::Null,
                    board_text.len() as u16,
                );
                let ended = Header::new(PacketType::Ended, opponent_slot as u8, outcome.winner, 0);
                let _ = send_packets(
                    &opponent.conn,
                    &[(moved, board_text.as_bytes()), (ended, &[])],
                )
                .await;
            }
            let header = Header::new(PacketType::Ended, slot_id as u8, outcome.winner, 0);
            let _ = send_packet(&self.conn, header, &[]).await;

            self.post_outcome(&invitation, outcome.winner);
        } else if let Some(opponent_slot) = opponent_slot {
            let header = Header::new(
                PacketType::Moved,
                opponent_slot as u8,
                Role::Null,
                board_text.len() as u16,
            );
            let _ = send_packet(&opponent.conn, header, board_text.as_bytes()).await;
        }
        Ok(())
    }

    fn opponent_in(
        self: &Arc<Self>,
        invitation: &Arc<Invitation<Client<C>>>,
    ) -> Result<Arc<Self>, ClientError> {
        if Arc::ptr_eq(invitation.source(), self) {
            Ok(Arc::clone(invitation.target()))
        } else if Arc::ptr_eq(invitation.target(), self) {
            Ok(Arc::clone(invitation.source()))
        } else {
            Err(ClientError::State("not a participant in this invitation".into()))
        }
    }

    fn post_outcome(self: &Arc<Self>, invitation: &Arc<Invitation<Client<C>>>, winner: Role) {
        let (first, second) = if invitation.source_role() == Role::First {
            (invitation.source().player(), invitation.target().player())
        } else {
            (invitation.target().player(), invitation.source().player())
        };
        if let (Some(first), Some(second)) = (first, second) {
            let outcome = match winner {
                Role::First => Outcome::FirstWins,
                Role::Second => Outcome::SecondWins,
                Role::Null => Outcome::Draw,
            };
            post_result(&first, &second, outcome);
        }
    }

    fn insert_invitation(
        &self,
        invitation: Arc<Invitation<Client<C>>>,
    ) -> Result<usize, ClientError> {
        let mut table = self.invitations.lock().unwrap();
        for (index, slot) in table.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(invitation);
                return Ok(index);
            }
        }
        if table.len() >= MAX_INVITATIONS {
            return Err(ClientError::Resource("invitation slot table is full".into()));
        }
        table.push(Some(invitation));
        Ok(table.len() - 1)
    }

    fn remove_invitation(&self, invitation: &Arc<Invitation<Client<C>>>) {
        let mut table = self.invitations.lock().unwrap();
        for slot in table.iter_mut() {
            if let Some(existing) = slot {
                if Arc::ptr_eq(existing, invitation) {
                    *slot = None;
                    return;
                }
            }
        }
    }

    fn slot_of(&self, invitation: &Arc<Invitation<Client<C>>>) -> Option<usize> {
        let table = self.invitations.lock().unwrap();
        table.iter().position(|slot| match slot {
            Some(existing) => Arc::ptr_eq(existing, invitation),
            None => false,
        })
    }

    fn invitation_at(&self, slot_id: usize) -> Result<Arc<Invitation<Client<C>>>, ClientError> {
        let table = self.invitations.lock().unwrap();
        table
            .get(slot_id)
            .and_then(|slot| slot.clone())
            .ok_or_else(|| ClientError::State(format!("no invitation in slot {slot_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxo_player::PlayerRegistry;
    use oxo_transport::{TcpConnection, TcpTransport, Transport};
    use tokio::net::TcpStream;

    async fn harness_pair() -> (Arc<Client<TcpConnection>>, Arc<Client<TcpConnection>>) {
        let mut transport = TcpTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = transport.local_addr().unwrap();

        let accept_a = tokio::spawn(async move { transport.accept().await.unwrap() });
        let peer_a = TcpStream::connect(addr).await.unwrap();
        let conn_a = accept_a.await.unwrap();

        let mut transport = TcpTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = transport.local_addr().unwrap();
        let accept_b = tokio::spawn(async move { transport.accept().await.unwrap() });
        let peer_b = TcpStream::connect(addr).await.unwrap();
        let conn_b = accept_b.await.unwrap();

        // Keep the raw peer sockets alive so the accepted halves stay open.
        std::mem::forget(peer_a);
        std::mem::forget(peer_b);

        (Client::new(conn_a), Client::new(conn_b))
    }

    #[tokio::test]
    async fn test_make_invitation_inserts_into_both_slot_tables() {
        let (alice, bob) = harness_pair().await;
        let players = PlayerRegistry::new();
        alice
            .login(players.login_or_create("alice").unwrap(), &crate::ClientRegistry::new())
            .unwrap();

        let source_slot = alice
            .make_invitation(&bob, Role::First, Role::Second)
            .await
            .unwrap();

        assert_eq!(source_slot, 0);
        assert!(alice.invitation_at(0).is_ok());
        assert!(bob.invitation_at(0).is_ok());
    }

    #[tokio::test]
    async fn test_make_invitation_second_invitation_gets_its_own_slot() {
        let (alice, bob) = harness_pair().await;
        let (_unused, carol) = harness_pair().await;

        let first_slot = alice
            .make_invitation(&bob, Role::First, Role::Second)
            .await
            .unwrap();
        let second_slot = alice
            .make_invitation(&carol, Role::First, Role::Second)
            .await
            .unwrap();

        assert_eq!(first_slot, 0);
        assert_eq!(second_slot, 1);
        let first_invitation = alice.invitation_at(first_slot).unwrap();
        let second_invitation = alice.invitation_at(second_slot).unwrap();
        assert!(Arc::ptr_eq(first_invitation.target(), &bob));
        assert!(Arc::ptr_eq(second_invitation.target(), &carol));
    }

    #[tokio::test]
    async fn test_revoke_closes_invitation_on_both_sides() {
        let (alice, bob) = harness_pair().await;
        let slot = alice
            .make_invitation(&bob, Role::First, Role::Second)
            .await
            .unwrap();

        alice.revoke(slot).await.unwrap();

        assert!(alice.invitation_at(slot).is_err());
        assert!(bob.invitation_at(0).is_err());
    }

    #[tokio::test]
    async fn test_revoke_by_non_source_is_rejected() {
        let (alice, bob) = harness_pair().await;
        let slot = alice
            .make_invitation(&bob, Role::First, Role::Second)
            .await
            .unwrap();

        assert!(bob.revoke(0).await.is_err());
        assert!(alice.invitation_at(slot).is_ok());
    }

    #[tokio::test]
    async fn test_decline_closes_invitation_on_both_sides() {
        let (alice, bob) = harness_pair().await;
        alice
            .make_invitation(&bob, Role::First, Role::Second)
            .await
            .unwrap();

        bob.decline(0).await.unwrap();

        assert!(alice.invitation_at(0).is_err());
        assert!(bob.invitation_at(0).is_err());
    }

    #[tokio::test]
    async fn test_accept_gives_board_to_whichever_side_moves_first() {
        let (alice, bob) = harness_pair().await;
        alice
            .make_invitation(&bob, Role::First, Role::Second)
            .await
            .unwrap();

        // Bob (target, SECOND) accepts; Alice (source, FIRST) moves first,
        // so the board goes to Alice via ACCEPTED and accept() returns None.
        let board_for_target = bob.accept(0).await.unwrap();
        assert!(board_for_target.is_none());
    }

    #[tokio::test]
    async fn test_accept_returns_board_when_target_moves_first() {
        let (alice, bob) = harness_pair().await;
        alice
            .make_invitation(&bob, Role::Second, Role::First)
            .await
            .unwrap();

        let board_for_target = bob.accept(0).await.unwrap();
        assert!(board_for_target.is_some());
    }

    #[tokio::test]
    async fn test_full_game_to_win_posts_rating_and_clears_slots() {
        let (alice, bob) = harness_pair().await;
        let players = PlayerRegistry::new();
        let registry = crate::ClientRegistry::new();
        let alice_player = players.login_or_create("alice").unwrap();
        let bob_player = players.login_or_create("bob").unwrap();
        alice.login(Arc::clone(&alice_player), &registry).unwrap();
        bob.login(Arc::clone(&bob_player), &registry).unwrap();

        alice
            .make_invitation(&bob, Role::First, Role::Second)
            .await
            .unwrap();
        bob.accept(0).await.unwrap();

        // X at 1, O at 4, X at 2, O at 5, X at 3 completes the top row for X.
        alice.make_move(0, "1").await.unwrap();
        bob.make_move(0, "4").await.unwrap();
        alice.make_move(0, "2").await.unwrap();
        bob.make_move(0, "5").await.unwrap();
        alice.make_move(0, "3").await.unwrap();

        assert!(alice.invitation_at(0).is_err());
        assert!(bob.invitation_at(0).is_err());
        assert!(alice_player.rating() > 1500);
        assert!(bob_player.rating() < 1500);
    }

    #[tokio::test]
    async fn test_resign_awards_opponent_and_closes_invitation() {
        let (alice, bob) = harness_pair().await;
        let players = PlayerRegistry::new();
        let registry = crate::ClientRegistry::new();
        let alice_player = players.login_or_create("alice").unwrap();
        let bob_player = players.login_or_create("bob").unwrap();
        alice.login(Arc::clone(&alice_player), &registry).unwrap();
        bob.login(Arc::clone(&bob_player), &registry).unwrap();

        alice
            .make_invitation(&bob, Role::First, Role::Second)
            .await
            .unwrap();
        bob.accept(0).await.unwrap();

        alice.resign(0).await.unwrap();

        assert!(alice.invitation_at(0).is_err());
        assert!(bob.invitation_at(0).is_err());
        assert!(bob_player.rating() > 1500);
        assert!(alice_player.rating() < 1500);
    }

    #[tokio::test]
    async fn test_logout_without_login_is_a_no_op() {
        let (alice, _bob) = harness_pair().await;
        alice.logout().await;
        assert!(!alice.is_logged_in());
    }

    #[tokio::test]
    async fn test_logout_revokes_pending_invitation_as_source() {
        let (alice, bob) = harness_pair().await;
        alice
            .make_invitation(&bob, Role::First, Role::Second)
            .await
            .unwrap();

        alice.logout().await;

        assert!(alice.invitation_at(0).is_err());
        assert!(bob.invitation_at(0).is_err());
    }

    #[tokio::test]
    async fn test_logout_resigns_accepted_game() {
        let (alice, bob) = harness_pair().await;
        let players = PlayerRegistry::new();
        let registry = crate::ClientRegistry::new();
        alice
            .login(players.login_or_create("alice").unwrap(), &registry)
            .unwrap();
        bob.login(players.login_or_create("bob").unwrap(), &registry)
            .unwrap();

        alice
            .make_invitation(&bob, Role::First, Role::Second)
            .await
            .unwrap();
        bob.accept(0).await.unwrap();

        alice.logout().await;

        assert!(bob.invitation_at(0).is_err());
    }

    #[tokio::test]
    async fn test_make_invitation_rejects_invalid_roles() {
        let (alice, bob) = harness_pair().await;
        let result = alice.make_invitation(&bob, Role::First, Role::First).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_make_move_out_of_turn_is_rejected() {
        let (alice, bob) = harness_pair().await;
        alice
            .make_invitation(&bob, Role::First, Role::Second)
            .await
            .unwrap();
        bob.accept(0).await.unwrap();

        // Alice (FIRST) moves first; Bob moving now is out of turn.
        assert!(bob.make_move(0, "1").await.is_err());
        assert!(alice.invitation_at(0).is_ok());
    }
}
