//! Protocol tunables, gathered into a single record instead of the
//! module-level globals the original implementation scattered across
//! `client.c`/`server.c`.

use std::net::SocketAddr;
use std::time::Duration;

/// Base window size `W`: the number of packets that may be in flight for a
/// single message at once.
pub const WINDOW: usize = 8;

/// Size of the extended sequence-number space `2·W`, used for both the send
/// window's and the receive buffer's slot arrays.
///
/// The extended space disambiguates a retransmission of the previous window
/// from a fresh send in the next one; at any moment at most [`WINDOW`] slots
/// are actually occupied (see `SendWindow` for the invariant).
pub const SEQ_SPACE: usize = 2 * WINDOW;

/// Size in bytes of a single chunk of user payload.
pub const CHUNK_SIZE: usize = 8;

/// Maximum length in bytes of one line read from standard input.
pub const MAXLINE: usize = 256;

/// Default capacity of the pending-message queue.
pub const PENDING_CAP: usize = 20;

/// Default retransmission timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

/// Default event-loop poll timeout.
pub const DEFAULT_POLL_WAIT: Duration = Duration::from_millis(2);

/// Every tunable needed to construct an [`Endpoint`](crate::engine::Endpoint)
/// and its [`EventLoop`](crate::event_loop::EventLoop).
///
/// Constructed once at startup from CLI arguments plus defaults, and threaded
/// through by value from then on: there is no mutable global state anywhere
/// in this crate.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Address of the peer endpoint, where data packets are sent.
    pub peer_addr: SocketAddr,
    /// Local address this endpoint binds its socket to.
    pub bind_addr: SocketAddr,
    /// How long an unacknowledged packet waits before being retransmitted.
    pub timeout: Duration,
    /// How long the event loop's readiness poll blocks per iteration.
    pub poll_wait: Duration,
    /// Capacity of the pending-message queue.
    pub pending_cap: usize,
}

impl Config {
    /// Builds a config with the documented defaults for everything but the
    /// addresses.
    #[must_use]
    pub fn new(peer_addr: SocketAddr, bind_addr: SocketAddr) -> Self {
        Self {
            peer_addr,
            bind_addr,
            timeout: DEFAULT_TIMEOUT,
            poll_wait: DEFAULT_POLL_WAIT,
            pending_cap: PENDING_CAP,
        }
    }
}
