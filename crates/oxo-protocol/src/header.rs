//! The fixed 16-byte packet header and the packet type / role bytes
//! embedded in it.
//!
//! Header fields, in order, big-endian on the wire:
//!
//! | Offset | Field | Size | Meaning |
//! |---|---|---|---|
//! | 0 | type | u8 | packet kind |
//! | 1 | id | u8 | invitation slot index on the recipient side |
//! | 2 | role | u8 | 0=NULL, 1=FIRST(X), 2=SECOND(O) |
//! | 3 | (pad) | u8 | reserved, zero on send |
//! | 4 | size | u16 | payload length in bytes |
//! | 6 | reserved | u16 | zero on send |
//! | 8 | timestamp_sec | u32 | sender's monotonic clock seconds |
//! | 12 | timestamp_nsec | u32 | nanoseconds |
//!
//! This layout is a wire contract: every implementation must produce bytes
//! identical to the bit pattern above, so it is hand-rolled with
//! `to_be_bytes`/`from_be_bytes` rather than run through a general-purpose
//! serialization format.

use std::fmt;
use std::sync::OnceLock;
use std::time::Instant;

use crate::ProtocolError;

/// The length in bytes of every packet header.
pub const HEADER_LEN: usize = 16;

/// The `type` byte: what kind of packet this is, and who may send it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    None = 0,
    Login = 1,
    Users = 2,
    Invite = 3,
    Revoke = 4,
    Accept = 5,
    Decline = 6,
    Move = 7,
    Resign = 8,
    Ack = 9,
    Nack = 10,
    Invited = 11,
    Revoked = 12,
    Accepted = 13,
    Declined = 14,
    Moved = 15,
    Resigned = 16,
    Ended = 17,
}

impl TryFrom<u8> for PacketType {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0 => PacketType::None,
            1 => PacketType::Login,
            2 => PacketType::Users,
            3 => PacketType::Invite,
            4 => PacketType::Revoke,
            5 => PacketType::Accept,
            6 => PacketType::Decline,
            7 => PacketType::Move,
            8 => PacketType::Resign,
            9 => PacketType::Ack,
            10 => PacketType::Nack,
            11 => PacketType::Invited,
            12 => PacketType::Revoked,
            13 => PacketType::Accepted,
            14 => PacketType::Declined,
            15 => PacketType::Moved,
            16 => PacketType::Resigned,
            17 => PacketType::Ended,
            other => {
                return Err(ProtocolError::InvalidMessage(format!(
                    "unknown packet type {other}"
                )))
            }
        })
    }
}

/// The `role` byte: which side of a game a client plays, or "no role".
///
/// `FIRST_PLAYER` plays X and moves first; `SECOND_PLAYER` plays O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Role {
    Null = 0,
    First = 1,
    Second = 2,
}

impl Role {
    /// The opposing role. `Null` maps to itself — there is no opposite
    /// of "no role".
    pub fn opposite(self) -> Role {
        match self {
            Role::Null => Role::Null,
            Role::First => Role::Second,
            Role::Second => Role::First,
        }
    }
}

impl TryFrom<u8> for Role {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0 => Role::Null,
            1 => Role::First,
            2 => Role::Second,
            other => {
                return Err(ProtocolError::InvalidMessage(format!(
                    "unknown role byte {other}"
                )))
            }
        })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Null => write!(f, "NULL"),
            Role::First => write!(f, "FIRST"),
            Role::Second => write!(f, "SECOND"),
        }
    }
}

/// A parsed packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub packet_type: PacketType,
    pub id: u8,
    pub role: Role,
    pub size: u16,
}

impl Header {
    /// Builds a header for an outbound packet; the timestamp is filled in
    /// at encode time.
    pub fn new(packet_type: PacketType, id: u8, role: Role, size: u16) -> Self {
        Self {
            packet_type,
            id,
            role,
            size,
        }
    }

    /// Serializes this header, including a fresh monotonic timestamp, to
    /// the exact 16-byte wire layout.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0] = self.packet_type as u8;
        buf[1] = self.id;
        buf[2] = self.role as u8;
        buf[3] = 0; // pad
        buf[4..6].copy_from_slice(&self.size.to_be_bytes());
        buf[6..8].copy_from_slice(&0u16.to_be_bytes());
        let (secs, nsecs) = monotonic_timestamp();
        buf[8..12].copy_from_slice(&secs.to_be_bytes());
        buf[12..16].copy_from_slice(&nsecs.to_be_bytes());
        buf
    }

    /// Parses a 16-byte buffer into a `Header`. The reserved/pad bytes
    /// and the timestamp are not validated, only consumed.
    pub fn decode(buf: &[u8; HEADER_LEN]) -> Result<Self, ProtocolError> {
        let packet_type = PacketType::try_from(buf[0])?;
        let id = buf[1];
        let role = Role::try_from(buf[2])?;
        let size = u16::from_be_bytes([buf[4], buf[5]]);
        Ok(Header {
            packet_type,
            id,
            role,
            size,
        })
    }
}

/// Returns (seconds, nanoseconds) elapsed on a monotonic clock anchored
/// at process start. The spec only requires the timestamp be monotonic
/// and is otherwise out of scope, so there is no wall-clock dependency.
fn monotonic_timestamp() -> (u32, u32) {
    static START: OnceLock<Instant> = OnceLock::new();
    let start = *START.get_or_init(Instant::now);
    let elapsed = start.elapsed();
    (elapsed.as_secs() as u32, elapsed.subsec_nanos())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_type_round_trip_all_variants() {
        for byte in 0u8..=17 {
            let kind = PacketType::try_from(byte).unwrap();
            assert_eq!(kind as u8, byte);
        }
    }

    #[test]
    fn test_packet_type_unknown_byte_is_invalid_message() {
        let err = PacketType::try_from(18).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidMessage(_)));
    }

    #[test]
    fn test_role_opposite() {
        assert_eq!(Role::First.opposite(), Role::Second);
        assert_eq!(Role::Second.opposite(), Role::First);
        assert_eq!(Role::Null.opposite(), Role::Null);
    }

    #[test]
    fn test_role_unknown_byte_is_invalid_message() {
        assert!(Role::try_from(3).is_err());
    }

    #[test]
    fn test_header_encode_decode_round_trip() {
        let header = Header::new(PacketType::Move, 7, Role::First, 42);
        let bytes = header.encode();
        assert_eq!(bytes.len(), HEADER_LEN);
        let decoded = Header::decode(&bytes).unwrap();
        assert_eq!(decoded.packet_type, PacketType::Move);
        assert_eq!(decoded.id, 7);
        assert_eq!(decoded.role, Role::First);
        assert_eq!(decoded.size, 42);
    }

    #[test]
    fn test_header_encode_layout_matches_wire_contract() {
        let header = Header::new(PacketType::Login, 0, Role::Null, 5);
        let bytes = header.encode();
        assert_eq!(bytes[0], 1); // Login
        assert_eq!(bytes[1], 0); // id
        assert_eq!(bytes[2], 0); // Null role
        assert_eq!(bytes[3], 0); // pad
        assert_eq!(u16::from_be_bytes([bytes[4], bytes[5]]), 5);
    }

    #[test]
    fn test_header_decode_rejects_unknown_type() {
        let mut bytes = Header::new(PacketType::None, 0, Role::Null, 0).encode();
        bytes[0] = 200;
        assert!(Header::decode(&bytes).is_err());
    }
}
