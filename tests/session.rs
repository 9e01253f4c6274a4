//! End-to-end scenarios exercised with a pair of in-process [`Endpoint`]s
//! passing `Vec<u8>` datagrams directly to each other (no bound sockets), so
//! these run deterministically and don't race real timers or ports.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use bytes::Bytes;
use sr_chat::config::Config;
use sr_chat::engine::Endpoint;

fn config() -> Config {
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
    Config::new(addr, addr)
}

/// Admits every chunk of the endpoint's current message, one at a time, the
/// way the event loop would across several iterations.
fn drain(ep: &mut Endpoint, now: Instant) -> Vec<Bytes> {
    let mut out = Vec::new();
    while let Some(packet) = ep.admit_next_chunk(now) {
        out.push(packet);
    }
    out
}

#[test]
fn clean_short_message() {
    let mut a = Endpoint::new(config());
    let mut b = Endpoint::new(config());
    let now = Instant::now();

    a.on_stdin_line(b"hello\n".to_vec());
    let sent = drain(&mut a, now);
    assert_eq!(1, sent.len());

    let event = b.on_socket_readable(&sent[0], now).unwrap();
    assert_eq!(b"hello\n\0\0".to_vec(), event.delivered_message.unwrap());
    assert_eq!(1, event.to_send.len(), "an ack for the single chunk");

    // feeding the ack back closes out A's side without error
    a.on_socket_readable(&event.to_send[0], now).unwrap();
}

#[test]
fn two_chunk_message_with_reordering() {
    let mut a = Endpoint::new(config());
    let mut b = Endpoint::new(config());
    let now = Instant::now();

    a.on_stdin_line(b"helloworld\n".to_vec());
    let sent = drain(&mut a, now);
    assert_eq!(2, sent.len());

    // seq 1 arrives first
    let event1 = b.on_socket_readable(&sent[1], now).unwrap();
    assert!(event1.delivered_message.is_none(), "gap at seq 0 withholds delivery");

    // then seq 0 closes the gap and flushes both chunks in order
    let event0 = b.on_socket_readable(&sent[0], now).unwrap();
    assert_eq!(
        b"helloworld\n\0\0\0\0\0".to_vec(),
        event0.delivered_message.unwrap()
    );
}

#[test]
fn single_packet_loss_then_retransmit() {
    let mut a = Endpoint::new(config());
    let mut b = Endpoint::new(config());
    let t0 = Instant::now();

    a.on_stdin_line(b"abcdefgh\n".to_vec());
    let sent = drain(&mut a, t0);
    assert_eq!(2, sent.len());

    // seq 0 is dropped in flight; only seq 1 arrives, and its ack makes it
    // back to A, so A knows seq 1 doesn't need resending
    let event = b.on_socket_readable(&sent[1], t0).unwrap();
    assert!(event.delivered_message.is_none());
    a.on_socket_readable(&event.to_send[0], t0).unwrap();

    // A's retransmission timer fires
    let later = t0 + Duration::from_millis(200);
    let resent = a.scan_timeouts(later);
    assert_eq!(1, resent.len(), "only the unacked seq 0 is resent");

    let event = b.on_socket_readable(&resent[0], later).unwrap();
    assert_eq!(
        b"abcdefgh\n\0\0\0\0\0\0\0".to_vec(),
        event.delivered_message.unwrap()
    );
}

#[test]
fn corruption_is_equivalent_to_loss() {
    let mut a = Endpoint::new(config());
    let mut b = Endpoint::new(config());
    let t0 = Instant::now();

    a.on_stdin_line(b"abcdefgh\n".to_vec());
    let sent = drain(&mut a, t0);

    let mut corrupted = sent[0].to_vec();
    corrupted[0] ^= 0xFF;
    let event = b.on_socket_readable(&corrupted, t0).unwrap();
    assert!(event.to_send.is_empty(), "corrupt packet gets no ack");
    assert!(event.delivered_message.is_none());

    let event = b.on_socket_readable(&sent[1], t0).unwrap();
    assert!(event.delivered_message.is_none());

    let later = t0 + Duration::from_millis(200);
    let resent = a.scan_timeouts(later);
    let event = b.on_socket_readable(&resent[0], later).unwrap();
    assert_eq!(
        b"abcdefgh\n\0\0\0\0\0\0\0".to_vec(),
        event.delivered_message.unwrap()
    );
}

#[test]
fn duplicate_ack_does_not_disturb_the_window() {
    let mut a = Endpoint::new(config());
    let mut b = Endpoint::new(config());
    let now = Instant::now();

    a.on_stdin_line(b"hi\n".to_vec());
    let sent = drain(&mut a, now);
    let event = b.on_socket_readable(&sent[0], now).unwrap();
    let ack = &event.to_send[0];

    // the ack is delivered twice
    a.on_socket_readable(ack, now).unwrap();
    a.on_socket_readable(ack, now).unwrap();

    // the window is free again either way: a new message starts cleanly
    a.on_stdin_line(b"again\n".to_vec());
    assert_eq!(1, drain(&mut a, now).len());
}

#[test]
fn session_end() {
    let mut a = Endpoint::new(config());
    let mut b = Endpoint::new(config());
    let now = Instant::now();

    a.on_stdin_line(b"BYE\n".to_vec());
    assert!(!a.local_done(), "queued, but not yet handed off for sending");

    let sent = drain(&mut a, now);
    assert!(a.local_done(), "A is done the instant its BYE is transmitted");

    let event = b.on_socket_readable(&sent[0], now).unwrap();
    assert!(event.peer_said_bye, "B observes A's BYE on decode");
}
