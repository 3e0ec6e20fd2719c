//! Error type for the rules engine.

/// Errors from parsing or applying a move.
///
/// Every variant here is a `StateError` in the spec's sense: invalid at
/// the game's current state, never an I/O or protocol failure. The
/// service loop turns all of these into a NACK; the session continues.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GameError {
    /// The move text didn't match the `"<digit>[<-X|<-O>]"` grammar, or
    /// its tag disagreed with the role the caller asserted.
    #[error("illegal move syntax: {0:?}")]
    IllegalSyntax(String),

    /// The cell named by the move is already occupied.
    #[error("cell already occupied")]
    CellOccupied,

    /// It isn't this role's turn to move.
    #[error("not this role's turn")]
    WrongTurn,

    /// The game has already terminated (win, draw, or resignation).
    #[error("game already terminated")]
    AlreadyTerminated,
}
