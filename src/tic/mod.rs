//! TIC protocol implementation
//!
//! This module provides a synchronous client for the TIC control protocol:
//! a newline-terminated, strictly request/response text protocol spoken over
//! TCP (default port 3874), optionally upgraded to TLS with `starttls`.
//!
//! # Architecture
//!
//! The client is layered leaf-first:
//!
//! - `SessionOps` abstracts the byte stream (plain TCP or TLS)
//! - `LineTransport` frames that stream into lines and supports the
//!   one-way upgrade to TLS
//! - `codec` parses status lines and multi-line blocks
//! - `handshake` drives the login sequence
//! - `TicClient` gates every resource query on the session state
//!
//! # Examples
//!
//! ```no_run
//! use tic_client::tic::{LoginOptions, TicClient};
//!
//! let mut client = TicClient::new();
//! client
//!     .login("user", "secret", "tic.example.net", &LoginOptions::default())
//!     .unwrap();
//!
//! for tunnel in client.list_tunnels() {
//!     println!("{:?}", client.get_tunnel(&tunnel.tunnel_id));
//! }
//!
//! client.logout(None);
//! ```

pub mod client;
pub mod clock;
pub mod codec;
pub mod config;
pub mod handshake;
pub mod record;
pub mod resource;
pub mod stream;
pub mod tls;
pub mod transport;

pub use client::{State, TicClient};
pub use codec::StatusLine;
pub use config::{ClientIdentity, LoginOptions, LoginOptionsBuilder, TlsMode};
pub use record::{DetailRecord, ListingRecord, Route, Tunnel};
pub use resource::ResourceKind;
pub use stream::SessionOps;
pub use transport::LineTransport;

/// Result type for TIC operations
pub type Result<T> = std::result::Result<T, Error>;

/// TIC operation errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] crate::net::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("TLS error: {0}")]
    Tls(#[from] tls::TlsError),

    #[error("TLS required but unavailable: {0}")]
    TlsUnavailable(String),

    #[error("Clock is off by {skew} seconds (tolerance {tolerance})")]
    ClockSkew { skew: u64, tolerance: u64 },

    #[error("Protocol error: {code} {message}")]
    Protocol { code: String, message: String },

    #[error("Crypto error: {0}")]
    Crypto(#[from] openssl::error::ErrorStack),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not connected")]
    NotConnected,
}

impl Error {
    /// Whether this error means the underlying connection is gone or unusable
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Network(_) | Error::ConnectionClosed | Error::Tls(_)
        )
    }
}

/// Default TIC server port
pub const DEFAULT_TIC_PORT: u16 = 3874;

/// Protocol version tag sent in the client identification line
pub const PROTOCOL_VERSION: &str = "draft-00";

/// Line terminator used on the wire
pub const LINE_TERMINATOR: &str = "\n";

/// Maximum accepted length of a received line, in bytes
pub const MAX_LINE_LENGTH: usize = 8192;

/// Status code announcing the start of a listing
pub const CODE_LIST_BEGIN: &str = "201";

/// Status code terminating a listing or detail block
pub const CODE_LIST_END: &str = "202";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_family() {
        assert!(Error::ConnectionClosed.is_connection());
        assert!(Error::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe)).is_connection());
        assert!(!Error::Malformed("x".into()).is_connection());
        assert!(!Error::InvalidArgument("x".into()).is_connection());
        assert!(!Error::Protocol {
            code: "500".into(),
            message: "no".into()
        }
        .is_connection());
    }

    #[test]
    fn test_error_display() {
        let err = Error::Protocol {
            code: "400".into(),
            message: "Unknown command".into(),
        };
        assert_eq!(err.to_string(), "Protocol error: 400 Unknown command");

        let err = Error::ClockSkew {
            skew: 500,
            tolerance: 120,
        };
        assert_eq!(err.to_string(), "Clock is off by 500 seconds (tolerance 120)");
    }
}
