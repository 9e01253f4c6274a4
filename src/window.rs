//! The send-side sliding window: tracks every packet currently in flight for
//! the one message an endpoint may be sending at a time, and drives
//! selective-repeat retransmission.

use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::codec::{encode, PAYLOAD_FIELD_SIZE};
use crate::config::{SEQ_SPACE, WINDOW};
use crate::error::WindowError;
use crate::rolling_buf::RollingBuf;
use crate::seq::Seq;

#[derive(Debug, Clone, Copy)]
struct Slot {
    payload: [u8; PAYLOAD_FIELD_SIZE],
    seq: Seq,
    remaining: i32,
    acked: bool,
    sent_at: Instant,
}

/// Bounded buffer of in-flight outbound packets for the current message.
///
/// Slots live in the extended sequence space `[0, 2·W)` (see
/// [`crate::config::SEQ_SPACE`]); at any moment at most `W`
/// ([`crate::config::WINDOW`]) of them are occupied, which is the invariant
/// `free` exists to enforce.
#[derive(Debug)]
pub struct SendWindow {
    slots: RollingBuf<Slot>,
    /// Sequence number of the oldest unacknowledged packet.
    base: u32,
    /// Next sequence number to assign to a newly admitted chunk.
    next_seq: u32,
    /// Number of times `next_seq` has wrapped during the current message.
    /// Diagnostic only; never used for indexing.
    pass: u32,
    /// Unused slots ahead of `base`, in `[0, W]`.
    free: usize,
    message_active: bool,
}

impl SendWindow {
    /// Creates an empty window with no message active.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: RollingBuf::new(SEQ_SPACE),
            base: 0,
            next_seq: 0,
            pass: 0,
            free: WINDOW,
            message_active: false,
        }
    }

    /// Number of free slots, in `[0, W]`.
    #[must_use]
    pub fn free(&self) -> usize {
        self.free
    }

    /// Whether a message is currently being sent (`admit` may be called).
    #[must_use]
    pub fn message_active(&self) -> bool {
        self.message_active
    }

    /// Number of times the sequence space has wrapped this message.
    /// Diagnostic only; not observable on the wire.
    #[must_use]
    pub fn pass(&self) -> u32 {
        self.pass
    }

    /// Starts a new message: the caller must have already confirmed the
    /// previous one fully completed (`free == W`).
    pub fn begin_message(&mut self) {
        debug_assert_eq!(WINDOW, self.free, "previous message must be fully acked");
        self.base = 0;
        self.next_seq = 0;
        self.pass = 0;
        self.message_active = true;
    }

    /// Resets the window, discarding any in-flight state. Called when the
    /// peer's receive buffer reports the message complete (see
    /// [`crate::recv::RecvBuffer::on_data`]).
    pub fn reset(&mut self) {
        self.slots.clear();
        self.base = 0;
        self.next_seq = 0;
        self.pass = 0;
        self.free = WINDOW;
        self.message_active = false;
    }

    /// Admits one chunk into the window, returning its encoded wire bytes.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::NoActiveMessage`] if no message is active, or
    /// [`WindowError::Full`] if there is no free slot.
    pub fn admit(
        &mut self,
        payload: [u8; PAYLOAD_FIELD_SIZE],
        remaining: i32,
        now: Instant,
    ) -> Result<Bytes, WindowError> {
        if !self.message_active {
            return Err(WindowError::NoActiveMessage);
        }
        if self.free == 0 {
            return Err(WindowError::Full);
        }

        let seq = Seq(self.next_seq);
        self.slots.set(
            seq.index(),
            Slot {
                payload,
                seq,
                remaining,
                acked: false,
                sent_at: now,
            },
        );
        self.free -= 1;
        self.next_seq = (self.next_seq + 1) % SEQ_SPACE as u32;
        if self.next_seq == 0 {
            self.pass += 1;
        }
        Ok(encode(&payload, seq, false, remaining))
    }

    /// Marks `seq` acknowledged and advances `base` through every
    /// consecutive acknowledged slot starting there. A duplicate ack (for a
    /// slot already acked, or already retired behind `base`) is a no-op.
    pub fn on_ack(&mut self, seq: Seq) {
        if let Some(slot) = self.slots.get_mut(seq.index()) {
            if slot.seq == seq {
                slot.acked = true;
            }
        }

        while self.free < WINDOW {
            match self.slots.get(self.base as usize) {
                Some(slot) if slot.seq.0 == self.base && slot.acked => {
                    self.slots.remove(self.base as usize);
                    self.free += 1;
                    self.base = (self.base + 1) % SEQ_SPACE as u32;
                }
                _ => break,
            }
        }
    }

    /// Walks the in-flight slots in order starting at `base`; every unacked
    /// slot whose send timer has expired is retransmitted (with a refreshed
    /// send time) and its bytes returned. Scanning stops at the first unacked
    /// slot that has not yet expired, since later slots were sent no earlier
    /// and so cannot have expired either.
    pub fn scan_timeouts(&mut self, now: Instant, timeout: Duration) -> Vec<Bytes> {
        let in_flight = WINDOW - self.free;
        let mut resend = Vec::new();
        let mut idx = self.base;
        for _ in 0..in_flight {
            if let Some(slot) = self.slots.get_mut(idx as usize) {
                if !slot.acked {
                    if now.duration_since(slot.sent_at) > timeout {
                        resend.push(encode(&slot.payload, slot.seq, false, slot.remaining));
                        slot.sent_at = now;
                    } else {
                        break;
                    }
                }
            }
            idx = (idx + 1) % SEQ_SPACE as u32;
        }
        resend
    }
}

impl Default for SendWindow {
    fn default() -> Self {
        Self::new()
    }
}
