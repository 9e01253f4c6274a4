//! The endpoint: glues the chunker, send window, receive buffer and pending
//! queue together into the state machine the event loop drives one
//! operation at a time. Framework-free (nothing here touches a socket or
//! stdin directly), so it can be driven from tests with plain byte slices
//! (see [`crate::event_loop`] for the half that does touch them).

use std::collections::VecDeque;
use std::time::Instant;

use bytes::Bytes;

use crate::chunker::{chunk_message, is_bye, Chunk};
use crate::codec::decode;
use crate::config::{Config, WINDOW};
use crate::error::CodecError;
use crate::recv::RecvBuffer;
use crate::window::SendWindow;

/// Outcome of feeding one inbound datagram to [`Endpoint::on_socket_readable`].
#[derive(Debug, Default)]
pub struct EndpointEvent {
    /// Packets that must now be written to the socket, in order.
    pub to_send: Vec<Bytes>,
    /// A fully reassembled inbound message, if this datagram completed one.
    pub delivered_message: Option<Vec<u8>>,
    /// Whether the message just delivered was the peer's `BYE`.
    pub peer_said_bye: bool,
}

/// One side of a two-party reliable chat session.
#[derive(Debug)]
pub struct Endpoint {
    send_window: SendWindow,
    recv_buffer: RecvBuffer,
    pending: crate::pending::PendingQueue,
    in_flight_chunks: VecDeque<Chunk>,
    /// Whether the message currently in flight is the `BYE` sentinel, so
    /// [`Self::admit_next_chunk`] knows to flip `local_done` once it's handed
    /// off its last (only) chunk.
    sending_bye: bool,
    local_done: bool,
    config: Config,
}

impl Endpoint {
    /// Creates a fresh endpoint with nothing queued or in flight.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            send_window: SendWindow::new(),
            recv_buffer: RecvBuffer::new(),
            pending: crate::pending::PendingQueue::new(config.pending_cap),
            in_flight_chunks: VecDeque::new(),
            sending_bye: false,
            local_done: false,
            config,
        }
    }

    /// Whether the local side has transmitted its own `BYE` message. Set the
    /// moment the (single) `BYE` chunk is handed off by
    /// [`Self::admit_next_chunk`] for the event loop to write to the socket;
    /// like the peer, this endpoint doesn't wait for an ack before
    /// considering its own side of the session finished.
    #[must_use]
    pub fn local_done(&self) -> bool {
        self.local_done
    }

    /// Admits one not-yet-sent chunk of the current message, if the send
    /// window has room. Called once per event-loop iteration, rather than
    /// draining the whole message at once, so a long message doesn't starve
    /// reception of the peer's packets.
    pub fn admit_next_chunk(&mut self, now: Instant) -> Option<Bytes> {
        if self.send_window.free() == 0 {
            return None;
        }
        let chunk = self.in_flight_chunks.pop_front()?;
        let packet = self
            .send_window
            .admit(chunk.payload, chunk.remaining, now)
            .expect("window just reported a free slot");
        if self.sending_bye && self.in_flight_chunks.is_empty() {
            // Fire-and-forget: the sender observes its own BYE the instant it
            // hands the chunk off for transmission, not once it's acked.
            self.local_done = true;
            self.sending_bye = false;
        }
        Some(packet)
    }

    /// If no message is currently active, dequeues and starts the next
    /// pending one. Returns whether a message was started.
    pub fn start_next_message(&mut self) -> bool {
        if self.send_window.message_active() || !self.in_flight_chunks.is_empty() {
            return false;
        }
        let Some(line) = self.pending.pop() else {
            return false;
        };
        let chunks = chunk_message(&line);
        self.sending_bye = chunks.first().is_some_and(|c| is_bye(&c.payload));
        self.in_flight_chunks = chunks.into();
        self.send_window.begin_message();
        true
    }

    /// Accepts one line read from standard input: starts it immediately if
    /// no message is in flight and the window has room, otherwise queues it
    /// behind whatever is already sending.
    pub fn on_stdin_line(&mut self, line: Vec<u8>) {
        self.pending.push(line);
        self.start_next_message();
    }

    /// Integrates one inbound datagram: an ack advances the send window
    /// (freeing it for [`Self::start_next_message`] on the next loop
    /// iteration once the whole message is acked); a data packet feeds the
    /// receive buffer and may complete a message.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the datagram is too short to be a packet.
    pub fn on_socket_readable(
        &mut self,
        datagram: &[u8],
        _now: Instant,
    ) -> Result<EndpointEvent, CodecError> {
        let packet = decode(datagram)?;
        let mut event = EndpointEvent::default();

        if packet.is_acked {
            self.send_window.on_ack(packet.seq);
            if self.send_window.message_active()
                && self.send_window.free() == WINDOW
                && self.in_flight_chunks.is_empty()
            {
                self.send_window.reset();
            }
        } else {
            let outcome = self.recv_buffer.on_data(&packet);
            event.to_send = outcome.ack.into_iter().collect();
            if outcome.message_complete {
                event.peer_said_bye = looks_like_bye(&outcome.delivered);
                event.delivered_message = Some(outcome.delivered);
            }
        }

        Ok(event)
    }

    /// Retransmits every in-flight packet whose retransmission timer has
    /// expired, per the configured timeout.
    pub fn scan_timeouts(&mut self, now: Instant) -> Vec<Bytes> {
        self.send_window.scan_timeouts(now, self.config.timeout)
    }
}

/// Whether a fully reassembled message is the `BYE` sentinel. Mirrors
/// [`is_bye`], adapted for a growable delivered buffer instead of one fixed
/// chunk payload.
fn looks_like_bye(delivered: &[u8]) -> bool {
    delivered.len() >= 3 && &delivered[..3] == b"BYE"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;
    use crate::seq::Seq;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    fn config() -> Config {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
        Config::new(addr, addr)
    }

    #[test]
    fn stdin_line_starts_immediately_when_idle() {
        let mut ep = Endpoint::new(config());
        ep.on_stdin_line(b"hi".to_vec());
        let sent = ep.admit_next_chunk(Instant::now());
        assert!(sent.is_some());
    }

    #[test]
    fn second_line_waits_behind_the_first() {
        let mut ep = Endpoint::new(config());
        let now = Instant::now();
        ep.on_stdin_line(b"first".to_vec());
        ep.admit_next_chunk(now);
        ep.on_stdin_line(b"second".to_vec());

        // still nothing left of "first" to admit, and "second" can't start yet
        assert!(ep.admit_next_chunk(now).is_none());
        assert!(!ep.start_next_message());
    }

    #[test]
    fn acking_the_only_chunk_lets_the_next_message_start() {
        let mut ep = Endpoint::new(config());
        let now = Instant::now();
        ep.on_stdin_line(b"first".to_vec());
        ep.admit_next_chunk(now);
        ep.on_stdin_line(b"second".to_vec());

        let ack = encode(&crate::codec::pack_payload(b"first"), Seq(0), true, 0);
        ep.on_socket_readable(&ack, now).unwrap();

        assert!(ep.start_next_message());
        assert!(ep.admit_next_chunk(now).is_some());
    }

    #[test]
    fn local_bye_is_not_done_until_the_chunk_is_handed_off() {
        let mut ep = Endpoint::new(config());
        assert!(!ep.local_done());
        ep.on_stdin_line(b"BYE\n".to_vec());
        assert!(!ep.local_done(), "queued, but not yet admitted for sending");

        ep.admit_next_chunk(Instant::now());
        assert!(ep.local_done(), "fire-and-forget: no ack wait needed");
    }

    #[test]
    fn receiving_a_full_message_reports_delivery() {
        let mut ep = Endpoint::new(config());
        let now = Instant::now();
        let payload = crate::codec::pack_payload(b"hello");
        let packet = encode(&payload, Seq(0), false, 0);

        let event = ep.on_socket_readable(&packet, now).unwrap();
        assert_eq!(1, event.to_send.len(), "an ack was generated");
        assert_eq!(b"hello\0\0\0".to_vec(), event.delivered_message.unwrap());
        assert!(!event.peer_said_bye);
    }

    #[test]
    fn receiving_bye_sets_peer_said_bye() {
        let mut ep = Endpoint::new(config());
        let now = Instant::now();
        let payload = crate::codec::pack_payload(b"BYE\n");
        let packet = encode(&payload, Seq(0), false, 0);

        let event = ep.on_socket_readable(&packet, now).unwrap();
        assert!(event.peer_said_bye);
    }
}
