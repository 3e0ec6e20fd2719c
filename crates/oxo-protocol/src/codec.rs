//! Packet framing on top of a raw [`Connection`]: full-write on send,
//! full-read on receive, exactly as the spec's `send`/`recv` contract
//! describes.

use oxo_transport::Connection;

use crate::header::{Header, HEADER_LEN};
use crate::{PacketType, ProtocolError, Role};

/// Serializes `header` and `payload` into one buffer and writes it in a
/// single [`Connection::send`] call, so the two halves of a packet can
/// never be split by another writer's bytes landing in between.
/// `header.size` must already equal `payload.len()`.
pub async fn send_packet(
    conn: &impl Connection,
    header: Header,
    payload: &[u8],
) -> Result<(), ProtocolError> {
    debug_assert_eq!(header.size as usize, payload.len());
    send_packets(conn, &[(header, payload)]).await
}

/// Serializes a whole sequence of packets into one buffer and writes it
/// with a single [`Connection::send`] call, making the sequence atomic
/// with respect to any other writer to the same connection. Used where a
/// single logical event produces more than one packet to the same peer
/// (e.g. RESIGNED followed by ENDED).
pub async fn send_packets(
    conn: &impl Connection,
    packets: &[(Header, &[u8])],
) -> Result<(), ProtocolError> {
    let mut buf = Vec::with_capacity(
        packets.iter().map(|(_, payload)| HEADER_LEN + payload.len()).sum(),
    );
    for (header, payload) in packets {
        debug_assert_eq!(header.size as usize, payload.len());
        buf.extend_from_slice(&header.encode());
        buf.extend_from_slice(payload);
    }
    conn.send(&buf).await
}

/// Convenience wrapper for the common case of a packet with no id/role.
pub async fn send_simple(
    conn: &impl Connection,
    packet_type: PacketType,
    payload: &[u8],
) -> Result<(), ProtocolError> {
    let header = Header::new(packet_type, 0, Role::Null, payload.len() as u16);
    send_packet(conn, header, payload).await
}

/// Reads one packet: the 16-byte header, then its payload if `size > 0`.
///
/// Returns `Ok(None)` if the connection closed cleanly at a packet
/// boundary (no bytes of a header were read). Any other end-of-stream —
/// mid-header or mid-payload — is a [`ProtocolError::InvalidMessage`].
pub async fn recv_packet(
    conn: &impl Connection,
) -> Result<Option<(Header, Vec<u8>)>, ProtocolError> {
    let mut header_buf = [0u8; HEADER_LEN];
    if !conn.recv_exact(&mut header_buf).await? {
        return Ok(None);
    }
    let header = Header::decode(&header_buf)?;

    if header.size == 0 {
        return Ok(Some((header, Vec::new())));
    }

    let mut payload = vec![0u8; header.size as usize];
    if !conn.recv_exact(&mut payload).await? {
        return Err(ProtocolError::InvalidMessage(
            "connection closed mid-payload".into(),
        ));
    }
    Ok(Some((header, payload)))
}
