//! Error types for the protocol layer.

use oxo_transport::TransportError;

/// Errors that can occur while framing or parsing a packet.
///
/// Every variant here is a `ProtocolError` in the spec's sense: a short
/// header, a truncated payload, or an unrecognized packet/role byte. The
/// service loop's policy for all of them is the same — terminate the
/// session — which is why `Io` (an underlying transport failure) lives
/// in this enum too rather than being handled separately.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The transport failed while reading or writing a packet.
    #[error(transparent)]
    Io(#[from] TransportError),

    /// The header or payload didn't parse: unknown packet type, invalid
    /// role byte, or the connection closed before a full payload arrived.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
