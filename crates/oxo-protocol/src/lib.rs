//! Wire protocol for the oxo match server.
//!
//! - **Header** ([`Header`], [`PacketType`], [`Role`]) — the fixed
//!   16-byte packet header and the enums its `type`/`role` bytes decode
//!   to.
//! - **Codec** ([`send_packet`], [`send_packets`], [`recv_packet`]) —
//!   full-write/full-read framing on top of an
//!   [`oxo_transport::Connection`]. [`send_packets`] writes a whole
//!   sequence in one [`oxo_transport::Connection::send`] call so it can't
//!   be interleaved with another writer's bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong parsing or
//!   transporting a packet.
//!
//! ```text
//! Transport (bytes) -> Protocol (Header + payload) -> domain crates
//! ```

mod codec;
mod error;
mod header;

pub use codec::{recv_packet, send_packet, send_packets, send_simple};
pub use error::ProtocolError;
pub use header::{Header, PacketType, Role, HEADER_LEN};
