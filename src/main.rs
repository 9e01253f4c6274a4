//! Command-line entry point: parses peer/local addresses, brings up the
//! event loop, and maps failures to process exit codes.

use std::net::{IpAddr, SocketAddr};
use std::process::ExitCode;

use clap::Parser;

use sr_chat::config::Config;
use sr_chat::event_loop::EventLoop;

/// Two-party chat over UDP, made reliable by a selective-repeat ARQ layer.
#[derive(Debug, Parser)]
#[command(name = "sr-chat", version, about)]
struct Args {
    /// IP address of the peer to exchange messages with.
    peer_addr: IpAddr,
    /// UDP port the peer is listening on.
    peer_port: u16,
    /// Local UDP port to bind and send from.
    local_port: u16,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let peer_addr = SocketAddr::new(args.peer_addr, args.peer_port);
    let bind_addr = SocketAddr::new("0.0.0.0".parse().expect("valid literal"), args.local_port);

    let config = Config::new(peer_addr, bind_addr);

    let mut event_loop = match EventLoop::new(config) {
        Ok(event_loop) => event_loop,
        Err(err) => {
            tracing::error!(error = %err, "failed to start");
            return ExitCode::FAILURE;
        }
    };

    match event_loop.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "engine failed");
            ExitCode::FAILURE
        }
    }
}
