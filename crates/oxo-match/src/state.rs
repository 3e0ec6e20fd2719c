//! The invitation lifecycle state.
//!
//! ```text
//! Open ──(accept)──→ Accepted ──(resign, or the last legal move)──→ Closed
//!   │
//!   └──(revoke / decline)──────────────────────────────────────────→ Closed
//! ```
//!
//! `Closed` is terminal — an invitation never leaves it.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationState {
    Open,
    Accepted,
    Closed,
}

impl InvitationState {
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }

    pub fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for InvitationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates_are_mutually_exclusive() {
        for state in [
            InvitationState::Open,
            InvitationState::Accepted,
            InvitationState::Closed,
        ] {
            let flags = [state.is_open(), state.is_accepted(), state.is_closed()];
            assert_eq!(flags.iter().filter(|b| **b).count(), 1);
        }
    }

    #[test]
    fn test_state_display() {
        assert_eq!(InvitationState::Open.to_string(), "OPEN");
        assert_eq!(InvitationState::Accepted.to_string(), "ACCEPTED");
        assert_eq!(InvitationState::Closed.to_string(), "CLOSED");
    }
}
