//! Splits an outbound line into fixed-size chunks, and recognises the `BYE`
//! session-termination sentinel on either side of the wire.

use crate::codec::{pack_payload, PAYLOAD_FIELD_SIZE};
use crate::config::CHUNK_SIZE;

/// One 8-byte chunk of an outbound message, plus how many chunks still
/// follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Padded payload bytes ready to hand to [`crate::codec::encode`].
    pub payload: [u8; PAYLOAD_FIELD_SIZE],
    /// Chunks still to follow after this one. `0` marks the last chunk.
    pub remaining: i32,
}

/// Splits `line` into `⌈line.len() / CHUNK_SIZE⌉` chunks, each exactly
/// [`CHUNK_SIZE`] bytes (the last zero-padded). A zero-length line still
/// produces exactly one chunk with `remaining = 0`.
#[must_use]
pub fn chunk_message(line: &[u8]) -> Vec<Chunk> {
    let num_chunks = line.len().div_ceil(CHUNK_SIZE).max(1);
    (0..num_chunks)
        .map(|i| {
            let start = i * CHUNK_SIZE;
            let end = (start + CHUNK_SIZE).min(line.len());
            Chunk {
                payload: pack_payload(&line[start..end]),
                #[allow(clippy::cast_possible_wrap)]
                remaining: (num_chunks - 1 - i) as i32,
            }
        })
        .collect()
}

/// Returns `true` if a chunk payload is the `BYE` session-termination
/// sentinel: its first three bytes are the ASCII literal `BYE`, whether
/// followed by nothing, a newline, or more zero padding.
#[must_use]
pub fn is_bye(payload: &[u8; PAYLOAD_FIELD_SIZE]) -> bool {
    &payload[..3] == b"BYE"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_line_is_one_chunk() {
        let chunks = chunk_message(b"");
        assert_eq!(1, chunks.len());
        assert_eq!(0, chunks[0].remaining);
        assert_eq!([0u8; PAYLOAD_FIELD_SIZE], chunks[0].payload);
    }

    #[test]
    fn exact_multiple_of_chunk_size() {
        let chunks = chunk_message(b"abcdefghijklmnop"); // 16 bytes -> 2 chunks
        assert_eq!(2, chunks.len());
        assert_eq!(1, chunks[0].remaining);
        assert_eq!(0, chunks[1].remaining);
        assert_eq!(b"abcdefgh", &chunks[0].payload[..CHUNK_SIZE]);
        assert_eq!(b"ijklmnop", &chunks[1].payload[..CHUNK_SIZE]);
    }

    #[test]
    fn last_chunk_is_zero_padded() {
        let chunks = chunk_message(b"hello\n"); // 6 bytes -> 1 chunk
        assert_eq!(1, chunks.len());
        assert_eq!(b"hello\n\0\0", &chunks[0].payload[..CHUNK_SIZE]);
    }

    #[test]
    fn bye_sentinel_detected_with_and_without_newline() {
        assert!(is_bye(&pack_payload(b"BYE")));
        assert!(is_bye(&pack_payload(b"BYE\n")));
        assert!(!is_bye(&pack_payload(b"hello\n")));
    }
}
