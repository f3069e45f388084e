//! Stream operations abstraction
//!
//! This module provides the stream operations pattern that lets the line
//! transport run over plain TCP before `starttls` and over TLS afterwards
//! without the framing code knowing which one it is talking to.

use super::tls::TlsSessionOps;
use super::{Error, Result};
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};

/// Stream operations trait
///
/// Defines the byte-level operations a transport needs, abstracting over
/// plain TCP and TLS connections.
pub trait SessionOps {
    /// Read data from the stream
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write data to the stream
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Flush buffered output
    fn flush(&mut self) -> Result<()>;

    /// Close the stream
    fn close(&mut self) -> Result<()>;
}

/// Plain TCP stream operations
pub struct FdSessionOps {
    stream: TcpStream,
}

impl FdSessionOps {
    /// Create new plain stream operations from a TCP stream
    pub fn new(stream: TcpStream) -> Self {
        FdSessionOps { stream }
    }

    /// Give up the TCP stream, e.g. to hand it to a TLS handshake
    pub fn into_inner(self) -> TcpStream {
        self.stream
    }
}

impl SessionOps for FdSessionOps {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.stream.read(buf).map_err(Error::from)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.stream.write(buf).map_err(Error::from)
    }

    fn flush(&mut self) -> Result<()> {
        self.stream.flush().map_err(Error::from)
    }

    fn close(&mut self) -> Result<()> {
        self.stream.shutdown(Shutdown::Both).map_err(Error::from)
    }
}

/// The stream a transport currently runs over
///
/// Moves one way only: `Plain` to `Tls`, or to `Closed` once the stream has
/// been consumed by a failed upgrade or shut down.
pub enum Link {
    Plain(FdSessionOps),
    Tls(Box<TlsSessionOps>),
    Closed,
}

impl Link {
    fn ops(&mut self) -> Result<&mut dyn SessionOps> {
        match self {
            Link::Plain(ops) => Ok(ops),
            Link::Tls(ops) => Ok(ops.as_mut()),
            Link::Closed => Err(Error::ConnectionClosed),
        }
    }
}

impl SessionOps for Link {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.ops()?.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.ops()?.write(buf)
    }

    fn flush(&mut self) -> Result<()> {
        self.ops()?.flush()
    }

    fn close(&mut self) -> Result<()> {
        match std::mem::replace(self, Link::Closed) {
            Link::Plain(mut ops) => ops.close(),
            Link::Tls(mut ops) => ops.close(),
            Link::Closed => Ok(()),
        }
    }
}
