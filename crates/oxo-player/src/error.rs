//! Error type for the player layer.

/// Errors from registering or naming a player.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlayerError {
    /// LOGIN was sent with an empty name.
    #[error("player name must not be empty")]
    EmptyName,
}
