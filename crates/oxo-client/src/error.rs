//! Error type for the per-connection client layer.
//!
//! Every variant here ends up as a NACK — the session is never torn down
//! because of one of these. Only a transport/protocol failure (handled
//! one layer up, in the service loop) terminates a session.

use oxo_game::GameError;
use oxo_match::MatchError;
use oxo_player::PlayerError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Invitation/game operation not permitted in the current state:
    /// accept when not OPEN, move when not ACCEPTED, wrong turn, cell
    /// taken, illegal move syntax, acting client is not a participant.
    #[error("state error: {0}")]
    State(String),

    /// LOGIN with a name another active client already holds, or
    /// INVITE naming a client that doesn't exist.
    #[error("name error: {0}")]
    Name(String),

    /// LOGIN while already logged in.
    #[error("already logged in")]
    DuplicateLogin,

    /// The invitation slot table is full.
    #[error("resource error: {0}")]
    Resource(String),
}

impl From<MatchError> for ClientError {
    fn from(err: MatchError) -> Self {
        ClientError::State(err.to_string())
    }
}

impl From<GameError> for ClientError {
    fn from(err: GameError) -> Self {
        ClientError::State(err.to_string())
    }
}

impl From<PlayerError> for ClientError {
    fn from(err: PlayerError) -> Self {
        ClientError::Name(err.to_string())
    }
}
