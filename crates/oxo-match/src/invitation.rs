//! A pending or active pairing between two clients.
//!
//! `Invitation` only knows about the two participants as an opaque type
//! `C` — it doesn't call back into whatever `C` actually is (a
//! connection, a socket handle, anything with an identity). That keeps
//! this crate free of any dependency on the client/transport layers
//! that hold the real connections; the caller supplies `Arc<C>` and
//! gets `Arc<C>` back when it needs to know who's on either side.

use std::sync::{Arc, Mutex};

use oxo_game::Game;
use oxo_protocol::Role;

use crate::error::MatchError;
use crate::state::InvitationState;

enum Inner {
    Open,
    Accepted(Arc<Game>),
    Closed,
}

impl Inner {
    fn state(&self) -> InvitationState {
        match self {
            Inner::Open => InvitationState::Open,
            Inner::Accepted(_) => InvitationState::Accepted,
            Inner::Closed => InvitationState::Closed,
        }
    }
}

/// Two-client pairing with assigned game roles. See [`InvitationState`]
/// for the lifecycle this type enforces.
pub struct Invitation<C: Send + Sync + 'static> {
    source: Arc<C>,
    target: Arc<C>,
    source_role: Role,
    target_role: Role,
    inner: Mutex<Inner>,
}

impl<C: Send + Sync + 'static> Invitation<C> {
    /// A fresh OPEN invitation. Fails if `source` and `target` are the
    /// same client, or if the assigned roles aren't one FIRST and one
    /// SECOND.
    pub fn create(
        source: Arc<C>,
        source_role: Role,
        target: Arc<C>,
        target_role: Role,
    ) -> Result<Arc<Self>, MatchError> {
        if Arc::ptr_eq(&source, &target) {
            return Err(MatchError::SameClient);
        }
        let roles_valid = matches!(
            (source_role, target_role),
            (Role::First, Role::Second) | (Role::Second, Role::First)
        );
        if !roles_valid {
            return Err(MatchError::InvalidRoles);
        }

        Ok(Arc::new(Self {
            source,
            target,
            source_role,
            target_role,
            inner: Mutex::new(Inner::Open),
        }))
    }

    pub fn source(&self) -> &Arc<C> {
        &self.source
    }

    pub fn target(&self) -> &Arc<C> {
        &self.target
    }

    pub fn source_role(&self) -> Role {
        self.source_role
    }

    pub fn target_role(&self) -> Role {
        self.target_role
    }

    /// The role `who` plays in this invitation, or `None` if `who` is
    /// neither participant.
    pub fn role_of(&self, who: &Arc<C>) -> Option<Role> {
        if Arc::ptr_eq(who, &self.source) {
            Some(self.source_role)
        } else if Arc::ptr_eq(who, &self.target) {
            Some(self.target_role)
        } else {
            None
        }
    }

    pub fn state(&self) -> InvitationState {
        self.inner.lock().unwrap().state()
    }

    /// The live `Game`, if this invitation is currently ACCEPTED.
    pub fn game(&self) -> Option<Arc<Game>> {
        match &*self.inner.lock().unwrap() {
            Inner::Accepted(game) => Some(Arc::clone(game)),
            _ => None,
        }
    }

    /// OPEN → ACCEPTED, creating a fresh Game atomically with the
    /// transition.
    pub fn accept(&self) -> Result<Arc<Game>, MatchError> {
        let mut inner = self.inner.lock().unwrap();
        match &*inner {
            Inner::Open => {
                let game = Arc::new(Game::create());
                *inner = Inner::Accepted(Arc::clone(&game));
                Ok(game)
            }
            _ => Err(MatchError::NotOpen),
        }
    }

    /// OPEN → CLOSED with no game ever having existed (revoke or
    /// decline).
    pub fn close_pending(&self) -> Result<(), MatchError> {
        let mut inner = self.inner.lock().unwrap();
        match &*inner {
            Inner::Open => {
                *inner = Inner::Closed;
                Ok(())
            }
            _ => Err(MatchError::NotOpen),
        }
    }

    /// ACCEPTED → CLOSED via resignation by `role`. Returns the
    /// opposing role, which is the winner.
    pub fn resign(&self, role: Role) -> Result<Role, MatchError> {
        let mut inner = self.inner.lock().unwrap();
        match &*inner {
            Inner::Accepted(game) => {
                let winner = game.resign(role);
                *inner = Inner::Closed;
                Ok(winner)
            }
            _ => Err(MatchError::NotAccepted),
        }
    }

    /// ACCEPTED → CLOSED because the Game ended on its own (the last
    /// legal move completed it). Call only after confirming
    /// `Game::is_over()`.
    pub fn close_finished(&self) -> Result<(), MatchError> {
        let mut inner = self.inner.lock().unwrap();
        match &*inner {
            Inner::Accepted(_) => {
                *inner = Inner::Closed;
                Ok(())
            }
            _ => Err(MatchError::NotAccepted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DummyClient(u64);

    #[test]
    fn test_create_rejects_self_invitation() {
        let client = Arc::new(DummyClient(1));
        let result = Invitation::create(
            Arc::clone(&client),
            Role::First,
            Arc::clone(&client),
            Role::Second,
        );
        assert_eq!(result.unwrap_err(), MatchError::SameClient);
    }

    #[test]
    fn test_create_rejects_duplicate_roles() {
        let source = Arc::new(DummyClient(1));
        let target = Arc::new(DummyClient(2));
        let result = Invitation::create(source, Role::First, target, Role::First);
        assert_eq!(result.unwrap_err(), MatchError::InvalidRoles);
    }

    #[test]
    fn test_create_rejects_null_role() {
        let source = Arc::new(DummyClient(1));
        let target = Arc::new(DummyClient(2));
        let result = Invitation::create(source, Role::Null, target, Role::Second);
        assert_eq!(result.unwrap_err(), MatchError::InvalidRoles);
    }

    #[test]
    fn test_create_starts_open() {
        let source = Arc::new(DummyClient(1));
        let target = Arc::new(DummyClient(2));
        let invitation =
            Invitation::create(source, Role::First, target, Role::Second).unwrap();
        assert_eq!(invitation.state(), InvitationState::Open);
        assert!(invitation.game().is_none());
    }

    #[test]
    fn test_role_of_identifies_each_participant() {
        let source = Arc::new(DummyClient(1));
        let target = Arc::new(DummyClient(2));
        let invitation = Invitation::create(
            Arc::clone(&source),
            Role::First,
            Arc::clone(&target),
            Role::Second,
        )
        .unwrap();
        assert_eq!(invitation.role_of(&source), Some(Role::First));
        assert_eq!(invitation.role_of(&target), Some(Role::Second));
        assert_eq!(invitation.role_of(&Arc::new(DummyClient(3))), None);
    }

    #[test]
    fn test_accept_transitions_to_accepted_with_fresh_game() {
        let source = Arc::new(DummyClient(1));
        let target = Arc::new(DummyClient(2));
        let invitation =
            Invitation::create(source, Role::First, target, Role::Second).unwrap();

        let game = invitation.accept().unwrap();

        assert_eq!(invitation.state(), InvitationState::Accepted);
        assert!(!game.is_over());
    }

    #[test]
    fn test_accept_twice_fails() {
        let source = Arc::new(DummyClient(1));
        let target = Arc::new(DummyClient(2));
        let invitation =
            Invitation::create(source, Role::First, target, Role::Second).unwrap();
        invitation.accept().unwrap();

        assert_eq!(invitation.accept().unwrap_err(), MatchError::NotOpen);
    }

    #[test]
    fn test_close_pending_transitions_open_to_closed() {
        let source = Arc::new(DummyClient(1));
        let target = Arc::new(DummyClient(2));
        let invitation =
            Invitation::create(source, Role::First, target, Role::Second).unwrap();

        invitation.close_pending().unwrap();

        assert_eq!(invitation.state(), InvitationState::Closed);
    }

    #[test]
    fn test_close_pending_after_accept_fails() {
        let source = Arc::new(DummyClient(1));
        let target = Arc::new(DummyClient(2));
        let invitation =
            Invitation::create(source, Role::First, target, Role::Second).unwrap();
        invitation.accept().unwrap();

        assert_eq!(invitation.close_pending().unwrap_err(), MatchError::NotOpen);
    }

    #[test]
    fn test_resign_closes_invitation_with_opponent_as_winner() {
        let source = Arc::new(DummyClient(1));
        let target = Arc::new(DummyClient(2));
        let invitation =
            Invitation::create(source, Role::First, target, Role::Second).unwrap();
        invitation.accept().unwrap();

        let winner = invitation.resign(Role::First).unwrap();

        assert_eq!(winner, Role::Second);
        assert_eq!(invitation.state(), InvitationState::Closed);
    }

    #[test]
    fn test_resign_before_accept_fails() {
        let source = Arc::new(DummyClient(1));
        let target = Arc::new(DummyClient(2));
        let invitation =
            Invitation::create(source, Role::First, target, Role::Second).unwrap();

        assert_eq!(invitation.resign(Role::First).unwrap_err(), MatchError::NotAccepted);
    }

    #[test]
    fn test_close_finished_requires_accepted_state() {
        let source = Arc::new(DummyClient(1));
        let target = Arc::new(DummyClient(2));
        let invitation =
            Invitation::create(source, Role::First, target, Role::Second).unwrap();
        assert_eq!(
            invitation.close_finished().unwrap_err(),
            MatchError::NotAccepted
        );

        invitation.accept().unwrap();
        invitation.close_finished().unwrap();
        assert_eq!(invitation.state(), InvitationState::Closed);
    }
}
