//! Error taxonomy for the engine, split by layer the way the original
//! protocol's failure modes were split (transient wire faults, local I/O
//! faults, and fatal startup faults).

use crate::octs::BytesError;

/// Failure decoding a packet from raw bytes.
///
/// Under the fixed packet size this is unreachable from a conforming peer;
/// the type exists so [`crate::codec::decode`] has a fallible signature
/// instead of panicking if a malformed datagram ever arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The datagram was shorter than a well-formed packet.
    #[error("packet too short: {0}")]
    TooShort(#[from] BytesError),
}

/// Failure reported by the send or receive window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    /// [`SendWindow::admit`](crate::window::SendWindow::admit) was called
    /// with no free slot.
    #[error("send window is full")]
    Full,
    /// No message is currently active on the send side.
    #[error("no message is active")]
    NoActiveMessage,
}

/// Failure local to one endpoint's socket I/O, never caused by the peer.
///
/// The engine logs these and continues; they are never propagated to the
/// user.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Sending a datagram on the local socket failed.
    #[error("failed to send datagram")]
    Send(#[source] std::io::Error),
    /// Receiving a datagram on the local socket failed.
    #[error("failed to receive datagram")]
    Recv(#[source] std::io::Error),
}

/// Fatal error during process bring-up.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The UDP socket could not be created or bound.
    #[error("failed to bind socket to {addr}")]
    Bind {
        /// Address that could not be bound.
        addr: std::net::SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The readiness primitive (`mio::Poll`) could not be constructed or
    /// could not register a source.
    #[error("failed to set up the event loop")]
    Poll(#[source] std::io::Error),
}
