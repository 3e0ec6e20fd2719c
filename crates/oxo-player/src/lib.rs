//! Player identity, rating, and the registry that canonicalizes names to
//! `Player` entities.
//!
//! ```text
//! Client layer (above)  ← holds an Arc<Player> reference while logged in
//!     ↕
//! Player layer (this crate)  ← identity, rating, registration
//! ```

mod error;
mod player;
mod registry;

pub use error::PlayerError;
pub use player::{Player, PlayerId, INITIAL_RATING};
pub use registry::{post_result, Outcome, PlayerRegistry};
