//! Line transport
//!
//! Frames a byte stream into newline-terminated protocol lines and owns the
//! in-place upgrade from plain TCP to TLS.

use super::stream::{FdSessionOps, Link, SessionOps};
use super::tls::{TlsConfig, TlsError, TlsInfo, TlsSessionOps};
use super::{Error, Result, LINE_TERMINATOR, MAX_LINE_LENGTH};
use crate::net::{self, ConnectOptions};
use std::net::TcpStream;

/// Line-level I/O used by the response codec
///
/// Implemented by `LineTransport`; kept as a trait so the codec can be
/// driven from any line source.
pub trait LineIo {
    /// Write `line` followed by the line terminator and flush
    fn send_line(&mut self, line: &str) -> Result<()>;

    /// Read one line with its terminator stripped
    ///
    /// Returns `Ok(None)` when the peer closed cleanly before any byte of a
    /// new line arrived.
    fn read_line(&mut self) -> Result<Option<String>>;
}

/// Line-buffered transport over plain TCP or TLS
pub struct LineTransport {
    link: Link,
    buffer: Vec<u8>,
}

impl LineTransport {
    /// Open a TCP connection to `host:port`
    pub fn connect(host: &str, port: u16, options: ConnectOptions) -> Result<Self> {
        tracing::debug!("connecting to {}:{}", host, port);
        let stream = net::connect(host, port, options)?;
        Ok(Self::from_stream(stream))
    }

    /// Wrap an already connected TCP stream
    pub fn from_stream(stream: TcpStream) -> Self {
        LineTransport {
            link: Link::Plain(FdSessionOps::new(stream)),
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Whether the transport has been upgraded to TLS
    pub fn is_tls(&self) -> bool {
        matches!(self.link, Link::Tls(_))
    }

    /// Whether the transport can still carry traffic
    pub fn is_open(&self) -> bool {
        !matches!(self.link, Link::Closed)
    }

    /// TLS details, once upgraded
    pub fn tls_info(&self) -> Option<&TlsInfo> {
        match &self.link {
            Link::Tls(ops) => Some(ops.info()),
            _ => None,
        }
    }

    /// Replace the plain stream with a TLS stream over the same socket
    ///
    /// The upgrade is one-way. On handshake failure the socket is gone and
    /// every later call fails with `ConnectionClosed`.
    pub fn upgrade_to_tls(&mut self, config: &TlsConfig, host: &str) -> Result<()> {
        if !self.buffer.is_empty() {
            // The server spoke before the handshake; those bytes would be
            // fed to OpenSSL as a ClientHello reply
            self.link.close().ok();
            self.buffer.clear();
            return Err(TlsError::Unusable(
                "unread data pending before TLS handshake".to_string(),
            )
            .into());
        }

        let plain = match std::mem::replace(&mut self.link, Link::Closed) {
            Link::Plain(ops) => ops,
            Link::Tls(ops) => {
                self.link = Link::Tls(ops);
                return Err(TlsError::InvalidConfig("transport already upgraded".to_string()).into());
            }
            Link::Closed => return Err(Error::ConnectionClosed),
        };

        let tls = TlsSessionOps::connect(plain.into_inner(), config, host)?;
        self.link = Link::Tls(Box::new(tls));
        Ok(())
    }

    /// Shut the connection down; later calls fail with `ConnectionClosed`
    pub fn close(&mut self) -> Result<()> {
        self.buffer.clear();
        self.link.close()
    }

    /// Pop one complete line out of the buffer, if there is one
    ///
    /// A line longer than `MAX_LINE_LENGTH` (terminator excluded) is an
    /// error whether or not its newline has arrived yet.
    fn take_line(&mut self) -> Result<Option<String>> {
        let pos = match self.buffer.iter().position(|&b| b == b'\n') {
            Some(pos) => pos,
            // One spare byte for a CR whose LF is still in flight
            None if self.buffer.len() > MAX_LINE_LENGTH + 1 => return Err(self.overlong()),
            None => return Ok(None),
        };

        let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if line.len() > MAX_LINE_LENGTH {
            return Err(self.overlong());
        }
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }

    /// Drop the link after an oversized line
    ///
    /// The rest of that line is still in flight, so the stream can never
    /// line up with a reply boundary again.
    fn overlong(&mut self) -> Error {
        self.buffer.clear();
        if let Err(e) = self.link.close() {
            tracing::debug!("close after oversized line: {}", e);
        }
        Error::Malformed(format!("line exceeds {} bytes", MAX_LINE_LENGTH))
    }
}

impl LineIo for LineTransport {
    fn send_line(&mut self, line: &str) -> Result<()> {
        let mut wire = String::with_capacity(line.len() + LINE_TERMINATOR.len());
        wire.push_str(line);
        wire.push_str(LINE_TERMINATOR);

        let bytes = wire.as_bytes();
        let mut written = 0;
        while written < bytes.len() {
            let n = self.link.write(&bytes[written..])?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
            written += n;
        }

        self.link.flush()
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(line) = self.take_line()? {
                return Ok(Some(line));
            }

            let mut temp = [0u8; 4096];
            let n = self.link.read(&mut temp)?;

            if n == 0 {
                // Peer hung up; nothing more can arrive on this link
                self.link.close().ok();
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                self.buffer.clear();
                return Err(Error::ConnectionClosed);
            }

            self.buffer.extend_from_slice(&temp[..n]);
        }
    }
}
