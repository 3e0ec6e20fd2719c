//! Unified error type for the oxo server binary.

use oxo_protocol::ProtocolError;
use oxo_transport::TransportError;

/// Top-level error wrapping the transport and protocol layers.
///
/// `#[from]` auto-generates the `From` impls so `?` converts sub-crate
/// errors automatically; everything below the service loop (client
/// operation failures) is handled locally as a NACK and never reaches
/// this type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
