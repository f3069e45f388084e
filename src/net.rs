//! Network connection helpers
//!
//! Resolves a host name and opens a blocking TCP connection to the first
//! address that accepts, with optional connect and I/O deadlines.

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Result type for network operations
pub type Result<T> = std::result::Result<T, Error>;

/// Connection establishment errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("no addresses found for {0}")]
    NoAddress(String),

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("socket error: {0}")]
    Socket(#[from] io::Error),
}

/// Options applied while opening a TCP connection
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectOptions {
    /// Maximum time to wait for the TCP handshake (None blocks indefinitely)
    pub connect_timeout: Option<Duration>,
    /// Read/write deadline installed on the connected socket
    pub io_timeout: Option<Duration>,
}

/// Resolve `host:port` and connect to the first reachable address
///
/// Every resolved address is tried in order; the error from the last
/// attempt is returned when none accept.
pub fn connect(host: &str, port: u16, options: ConnectOptions) -> Result<TcpStream> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| Error::Resolve {
            host: host.to_string(),
            source,
        })?
        .collect();

    let mut last_err = None;
    for addr in addrs {
        match connect_addr(addr, options) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                tracing::debug!("connect to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| Error::NoAddress(host.to_string())))
}

fn connect_addr(addr: SocketAddr, options: ConnectOptions) -> Result<TcpStream> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    let target = SockAddr::from(addr);

    let connected = match options.connect_timeout {
        Some(timeout) => socket.connect_timeout(&target, timeout),
        None => socket.connect(&target),
    };
    connected.map_err(|source| Error::Connect { addr, source })?;

    // Request/response traffic is one short line at a time
    socket.set_nodelay(true)?;
    socket.set_read_timeout(options.io_timeout)?;
    socket.set_write_timeout(options.io_timeout)?;

    Ok(socket.into())
}
