//! TLS stream operations
//!
//! This module implements the SessionOps trait for TLS connections, so the
//! line transport can keep reading and writing lines after `starttls`.

use super::config::{TlsConfig, TlsError};
use super::info::TlsInfo;
use crate::tic::stream::SessionOps;
use crate::tic::{Error, Result as TicResult};
use openssl::ssl::{Ssl, SslStream};
use std::io::{Read, Write};
use std::net::{IpAddr, Shutdown, TcpStream};

/// TLS stream operations
///
/// Wraps an OpenSSL SslStream and provides read/write/flush/close.
pub struct TlsSessionOps {
    stream: SslStream<TcpStream>,
    info: TlsInfo,
    failed: bool,
}

impl TlsSessionOps {
    /// Run a client handshake over an already connected TCP stream
    ///
    /// `host` is the server name the caller dialed. It is sent as SNI and
    /// checked against the certificate unless the config overrides it.
    /// IP literals are verified as addresses and never sent as SNI.
    pub fn connect(
        tcp_stream: TcpStream,
        config: &TlsConfig,
        host: &str,
    ) -> std::result::Result<Self, TlsError> {
        let mut ssl = Ssl::new(&config.ctx)?;
        let name = config.servername.as_deref().unwrap_or(host);

        match name.parse::<IpAddr>() {
            Ok(ip) => {
                if config.verify_peer {
                    ssl.param_mut().set_ip(ip)?;
                }
            }
            Err(_) => {
                ssl.set_hostname(name)?;
                if config.verify_peer {
                    ssl.param_mut().set_host(name)?;
                }
            }
        }

        // Blocking handshake; the stream is consumed on failure
        let ssl_stream = ssl
            .connect(tcp_stream)
            .map_err(|e| TlsError::HandshakeFailed(e.to_string()))?;

        let info = TlsInfo::from_ssl(ssl_stream.ssl());
        tracing::debug!("TLS established: {} {}", info.version, info.cipher);

        Ok(TlsSessionOps {
            stream: ssl_stream,
            info,
            failed: false,
        })
    }

    /// Details negotiated during the handshake
    pub fn info(&self) -> &TlsInfo {
        &self.info
    }
}

impl SessionOps for TlsSessionOps {
    fn read(&mut self, buf: &mut [u8]) -> TicResult<usize> {
        self.stream.read(buf).map_err(|e| {
            self.failed = true;
            Error::Io(e)
        })
    }

    fn write(&mut self, buf: &[u8]) -> TicResult<usize> {
        self.stream.write(buf).map_err(|e| {
            self.failed = true;
            Error::Io(e)
        })
    }

    fn flush(&mut self) -> TicResult<()> {
        self.stream.flush().map_err(|e| {
            self.failed = true;
            Error::Io(e)
        })
    }

    fn close(&mut self) -> TicResult<()> {
        // Send close_notify unless the session already broke
        if !self.failed {
            let _ = self.stream.shutdown();
        }

        self.stream
            .get_mut()
            .shutdown(Shutdown::Both)
            .map_err(Error::from)
    }
}
