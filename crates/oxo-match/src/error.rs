//! Error type for the invitation layer.

/// Errors from creating or transitioning an [`crate::Invitation`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MatchError {
    /// `make_invitation` was asked to pair a client with itself.
    #[error("a client cannot invite itself")]
    SameClient,

    /// The two assigned roles weren't one FIRST and one SECOND.
    #[error("invitation roles must be distinct and non-null")]
    InvalidRoles,

    /// The operation requires the invitation to still be OPEN.
    #[error("invitation is not open")]
    NotOpen,

    /// The operation requires the invitation to be ACCEPTED.
    #[error("invitation is not accepted")]
    NotAccepted,
}
