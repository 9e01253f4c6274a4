//! The fixed-size on-wire packet: encoding, decoding, and the additive
//! checksum used to detect corruption.
//!
//! # Wire layout
//!
//! Fields are written in declaration order, each a native-endian integer
//! (see [`crate::octs`]): `payload` (9 bytes), `checksum` (i32), `seq` (i32),
//! `is_acked` (i32), `send_time` (i64, microseconds), `remaining` (i32).
//! Compatibility only matters between two instances of this program, so the
//! exact endianness is not contractual, only self-consistency is.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Bytes, BytesMut};

use crate::config::CHUNK_SIZE;
use crate::error::CodecError;
use crate::octs::{ReadBytes, WriteBytes};
use crate::seq::Seq;

/// Size of the `payload` field: [`CHUNK_SIZE`] data bytes plus a trailing
/// zero byte, always zero, kept for wire compatibility with the source
/// layout.
pub const PAYLOAD_FIELD_SIZE: usize = CHUNK_SIZE + 1;

/// Total encoded size of a [`Packet`].
pub const PACKET_SIZE: usize = PAYLOAD_FIELD_SIZE + 4 + 4 + 4 + 8 + 4;

/// A decoded packet, carrying either a chunk of message payload
/// (`is_acked = false`) or an acknowledgement of one (`is_acked = true`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    /// Up to [`CHUNK_SIZE`] bytes of payload, zero-padded; the 9th byte is
    /// always zero.
    pub payload: [u8; PAYLOAD_FIELD_SIZE],
    /// Integrity tag computed over `seq` and `payload` (see [`checksum`]).
    pub checksum: i32,
    /// Sequence number in the extended window space.
    pub seq: Seq,
    /// Whether this packet acknowledges `seq` rather than carrying data.
    pub is_acked: bool,
    /// Sender-local transmit timestamp, in microseconds. Meaningless to the
    /// receiver; used only by the sender's own retransmission timer.
    pub send_time: i64,
    /// Number of chunks still to follow after this one in the current
    /// message. `0` marks the last chunk.
    pub remaining: i32,
}

/// Computes the additive checksum: `seq + Σ payload[i]` for `i` in
/// `0..CHUNK_SIZE`, with each payload byte sign-extended to 32 bits before
/// summing, wrapping on overflow.
///
/// This is a deliberately weak integrity check (it cannot detect common
/// single-bit flips that cancel out in the sum) preserved verbatim for wire
/// compatibility with the existing peer.
#[must_use]
pub fn checksum(seq: Seq, payload: &[u8; PAYLOAD_FIELD_SIZE]) -> i32 {
    #[allow(clippy::cast_possible_wrap)]
    let seq = seq.0 as i32;
    payload[..CHUNK_SIZE]
        .iter()
        .fold(seq, |sum, &byte| sum.wrapping_add(i32::from(byte as i8)))
}

/// Builds a chunk payload from up to [`CHUNK_SIZE`] data bytes, zero-padding
/// the rest (including the trailing 9th byte, which is always zero).
#[must_use]
pub fn pack_payload(data: &[u8]) -> [u8; PAYLOAD_FIELD_SIZE] {
    debug_assert!(data.len() <= CHUNK_SIZE);
    let mut payload = [0u8; PAYLOAD_FIELD_SIZE];
    payload[..data.len()].copy_from_slice(data);
    payload
}

/// Microseconds since the Unix epoch, truncated to fit an `i64`.
///
/// Only meaningful as a monotonically-increasing-in-practice local
/// timestamp; never interpreted by the peer.
#[must_use]
pub fn now_micros() -> i64 {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    i64::try_from(elapsed.as_micros()).unwrap_or(i64::MAX)
}

/// Encodes a data or ack packet for `seq`, stamping `send_time` as `now`.
#[must_use]
pub fn encode(payload: &[u8; PAYLOAD_FIELD_SIZE], seq: Seq, is_acked: bool, remaining: i32) -> Bytes {
    let mut buf = BytesMut::with_capacity(PACKET_SIZE);
    buf.write_slice(payload).expect("buffer sized for packet");
    buf.write_i32(checksum(seq, payload))
        .expect("buffer sized for packet");
    buf.write(&seq).expect("buffer sized for packet");
    buf.write_i32(i32::from(is_acked))
        .expect("buffer sized for packet");
    buf.write_i64(now_micros()).expect("buffer sized for packet");
    buf.write_i32(remaining).expect("buffer sized for packet");
    buf.freeze()
}

/// Re-encodes an already-known packet verbatim except for a freshened
/// `send_time`, as used by [`crate::window::SendWindow::scan_timeouts`] when
/// retransmitting.
#[must_use]
pub fn re_encode(packet: &Packet) -> Bytes {
    encode(&packet.payload, packet.seq, packet.is_acked, packet.remaining)
}

/// Decodes a packet from a raw datagram.
///
/// Never fails on a conforming peer (every byte image of [`PACKET_SIZE`]
/// parses); returns [`CodecError`] only if the datagram is shorter than
/// expected. Checksum validity is the caller's concern (see
/// [`checksum`]/[`Packet::is_corrupt`]).
pub fn decode(bytes: &[u8]) -> Result<Packet, CodecError> {
    let mut buf = Bytes::copy_from_slice(bytes);
    let payload: [u8; PAYLOAD_FIELD_SIZE] = buf
        .read_slice(PAYLOAD_FIELD_SIZE)?
        .as_ref()
        .try_into()
        .expect("read_slice returns exactly PAYLOAD_FIELD_SIZE bytes");
    let checksum = buf.read_i32()?;
    let seq = buf.read::<Seq>()?;
    let is_acked = buf.read_i32()? != 0;
    let send_time = buf.read_i64()?;
    let remaining = buf.read_i32()?;
    Ok(Packet {
        payload,
        checksum,
        seq,
        is_acked,
        send_time,
        remaining,
    })
}

impl Packet {
    /// Whether the stored checksum disagrees with a freshly computed one,
    /// i.e. this packet was corrupted in transit.
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        checksum(self.seq, &self.payload) != self.checksum
    }
}
