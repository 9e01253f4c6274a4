//! The single-threaded event loop: multiplexes standard input, the UDP
//! socket, and the retransmission timer over one `mio::Poll`, the direct
//! analogue of the two-descriptor `poll()` loop this protocol was born from.

use std::io::{self, BufRead, Write};
use std::time::Instant;

use mio::net::UdpSocket;
use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Token};

use crate::config::Config;
use crate::engine::Endpoint;
use crate::error::{EngineError, StartupError};

const STDIN: Token = Token(0);
const SOCKET: Token = Token(1);

/// Drives one [`Endpoint`] to completion against a bound socket and stdin.
pub struct EventLoop {
    poll: Poll,
    events: Events,
    socket: UdpSocket,
    config: Config,
    endpoint: Endpoint,
    stdin: io::BufReader<io::Stdin>,
    stdin_eof: bool,
}

impl EventLoop {
    /// Binds the local socket and registers it, standard input, and the
    /// retransmission timer with a fresh readiness poll.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] if the socket cannot be bound or the poll
    /// cannot be constructed.
    pub fn new(config: Config) -> Result<Self, StartupError> {
        let mut socket =
            UdpSocket::bind(config.bind_addr).map_err(|source| StartupError::Bind {
                addr: config.bind_addr,
                source,
            })?;
        socket
            .connect(config.peer_addr)
            .map_err(|source| StartupError::Bind {
                addr: config.peer_addr,
                source,
            })?;

        let poll = Poll::new().map_err(StartupError::Poll)?;
        poll.registry()
            .register(&mut socket, SOCKET, Interest::READABLE)
            .map_err(StartupError::Poll)?;
        poll.registry()
            .register(
                &mut SourceFd(&libc::STDIN_FILENO),
                STDIN,
                Interest::READABLE,
            )
            .map_err(StartupError::Poll)?;

        Ok(Self {
            poll,
            events: Events::with_capacity(2),
            socket,
            endpoint: Endpoint::new(config),
            config,
            stdin: io::BufReader::new(io::stdin()),
            stdin_eof: false,
        })
    }

    /// Runs until `BYE` is observed in either direction: this side has
    /// transmitted its own `BYE` (stdin typed it, or hit EOF, treated as an
    /// implicit `BYE`), or the peer's `BYE` was just decoded off the wire.
    /// Neither side waits on the other: whichever happens first ends the
    /// loop, matching the fire-and-forget termination the protocol uses.
    ///
    /// Per iteration: admit one not-yet-sent chunk of the current message if
    /// the window has room, start the next pending message if none is
    /// active, block on readiness for the socket and stdin, dispatch
    /// whichever fired, then scan for expired retransmission timers, in
    /// that order, unconditionally every iteration.
    pub fn run(&mut self) -> Result<(), EngineError> {
        let mut peer_done = false;

        loop {
            if peer_done || self.endpoint.local_done() {
                tracing::info!("session complete, exiting");
                return Ok(());
            }

            if let Some(chunk) = self.endpoint.admit_next_chunk(Instant::now()) {
                self.send_one(&chunk)?;
            }
            self.endpoint.start_next_message();

            if let Err(err) = self.poll.poll(&mut self.events, Some(self.config.poll_wait)) {
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(EngineError::Recv(err));
            }

            let mut ready_stdin = false;
            let mut ready_socket = false;
            for event in self.events.iter() {
                match event.token() {
                    STDIN => ready_stdin = true,
                    SOCKET => ready_socket = true,
                    _ => {}
                }
            }

            if ready_stdin && !self.stdin_eof {
                self.handle_stdin();
            }

            if ready_socket {
                self.handle_socket(&mut peer_done)?;
            }

            self.handle_timeouts();
        }
    }

    fn handle_stdin(&mut self) {
        let mut line = String::new();
        match self.stdin.read_line(&mut line) {
            Ok(0) => {
                tracing::debug!("stdin closed, sending BYE");
                self.stdin_eof = true;
                self.endpoint.on_stdin_line(b"BYE\n".to_vec());
            }
            Ok(_) => self.endpoint.on_stdin_line(line.into_bytes()),
            Err(err) => tracing::warn!(error = %err, "failed to read stdin"),
        }
    }

    fn handle_socket(&mut self, peer_done: &mut bool) -> Result<(), EngineError> {
        let mut buf = [0u8; crate::codec::PACKET_SIZE];
        loop {
            match self.socket.recv(&mut buf) {
                Ok(n) => {
                    let Ok(event) = self.endpoint.on_socket_readable(&buf[..n], Instant::now())
                    else {
                        tracing::warn!("dropped undersized datagram");
                        continue;
                    };
                    if let Some(message) = event.delivered_message {
                        if event.peer_said_bye {
                            tracing::info!("peer said BYE");
                            *peer_done = true;
                        } else {
                            // Trailing zero padding in the last chunk is
                            // emitted as-is; the newline each line ends with
                            // is what delimits it for the reader.
                            let mut stdout = io::stdout();
                            let _ = stdout.write_all(&message);
                            let _ = stdout.flush();
                        }
                    }
                    self.send_all(event.to_send)?;
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                Err(err) => return Err(EngineError::Recv(err)),
            }
        }
        Ok(())
    }

    fn handle_timeouts(&mut self) {
        let resends = self.endpoint.scan_timeouts(Instant::now());
        if let Err(err) = self.send_all(resends) {
            tracing::warn!(error = %err, "failed to retransmit");
        }
    }

    fn send_one(&mut self, packet: &bytes::Bytes) -> Result<(), EngineError> {
        self.socket.send(packet).map_err(EngineError::Send)?;
        Ok(())
    }

    fn send_all(&mut self, packets: Vec<bytes::Bytes>) -> Result<(), EngineError> {
        for packet in &packets {
            self.send_one(packet)?;
        }
        Ok(())
    }
}
