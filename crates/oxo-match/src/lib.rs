//! The invitation state machine that pairs two clients into a game.
//!
//! ```text
//! Client layer (above)  ← owns the slot table, sends the notifications
//!     ↕
//! Invitation layer (this crate)  ← OPEN / ACCEPTED / CLOSED, owns the Game
//! ```

mod error;
mod invitation;
mod state;

pub use error::MatchError;
pub use invitation::Invitation;
pub use state::InvitationState;
