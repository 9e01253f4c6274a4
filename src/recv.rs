//! The receive-side reassembly buffer: stores out-of-order data packets,
//! emits acknowledgements, and delivers payload bytes to the application in
//! order.

use bytes::Bytes;

use crate::codec::{encode, Packet, PAYLOAD_FIELD_SIZE};
use crate::config::{CHUNK_SIZE, SEQ_SPACE, WINDOW};
use crate::rolling_buf::RollingBuf;

/// Result of feeding one inbound data packet to [`RecvBuffer::on_data`].
#[derive(Debug, Default, Clone)]
pub struct RecvOutcome {
    /// An ACK packet to send back to the peer, if the packet warranted one.
    pub ack: Option<Bytes>,
    /// Payload bytes newly delivered to the application, in order. Empty
    /// unless this packet closed a gap at the front of the buffer.
    pub delivered: Vec<u8>,
    /// Whether the chunk delivered as part of this call was the last one of
    /// the message (`remaining == 0`), meaning the buffer has been reset.
    pub message_complete: bool,
}

/// Bounded out-of-order store for inbound data packets, draining into
/// in-order delivery as gaps close.
#[derive(Debug)]
pub struct RecvBuffer {
    slots: RollingBuf<Packet>,
    /// Sequence number of the next chunk to deliver.
    deliver_idx: u32,
}

impl RecvBuffer {
    /// Creates an empty buffer awaiting the start of a message.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: RollingBuf::new(SEQ_SPACE),
            deliver_idx: 0,
        }
    }

    /// Index of the next chunk awaited for in-order delivery.
    #[must_use]
    pub fn deliver_idx(&self) -> u32 {
        self.deliver_idx
    }

    /// Zeroes the buffer and resets the delivery cursor to the start of the
    /// sequence space, as happens when a message completes.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.deliver_idx = 0;
    }

    /// Whether `seq_idx` falls behind the delivery cursor by more than a
    /// window's width, and so must be a duplicate of an already-delivered
    /// chunk rather than one still in flight.
    fn is_stale(&self, seq_idx: u32) -> bool {
        let offset = (seq_idx + SEQ_SPACE as u32 - self.deliver_idx) % SEQ_SPACE as u32;
        offset as usize >= WINDOW
    }

    /// Integrates one inbound data packet.
    ///
    /// A corrupt packet (see [`Packet::is_corrupt`]) is dropped silently: no
    /// ack, no delivery. A duplicate of an already-delivered chunk gets its
    /// ack resent (the sender is still waiting on it) but is not re-stored.
    /// A fresh chunk is stored and acked; any run of consecutive chunks now
    /// available starting at the delivery cursor is drained into
    /// `delivered`, in order.
    #[must_use]
    pub fn on_data(&mut self, packet: &Packet) -> RecvOutcome {
        let mut outcome = RecvOutcome::default();
        if packet.is_corrupt() {
            return outcome;
        }

        let seq_idx = packet.seq.index() as u32;
        if self.is_stale(seq_idx) {
            outcome.ack = Some(encode(&packet.payload, packet.seq, true, packet.remaining));
            return outcome;
        }

        if self.slots.get(packet.seq.index()).is_none() {
            self.slots.set(packet.seq.index(), *packet);
            outcome.ack = Some(encode(&packet.payload, packet.seq, true, packet.remaining));
        }

        while let Some(slot) = self.slots.get(self.deliver_idx as usize) {
            outcome
                .delivered
                .extend_from_slice(&slot.payload[..CHUNK_SIZE]);
            let complete = slot.remaining == 0;
            self.slots.remove(self.deliver_idx as usize);
            self.deliver_idx += 1;
            if self.deliver_idx == SEQ_SPACE as u32 {
                self.deliver_idx = 0;
                self.slots.clear();
            }
            if complete {
                outcome.message_complete = true;
                break;
            }
        }

        if outcome.message_complete {
            self.reset();
        }

        outcome
    }
}

impl Default for RecvBuffer {
    fn default() -> Self {
        Self::new()
    }
}
