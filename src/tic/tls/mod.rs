//! TLS support for TIC connections
//!
//! A TIC session starts in plaintext and may be upgraded in place once the
//! server accepts `starttls`. This module holds the client side of that
//! upgrade.
//!
//! # Architecture
//!
//! 1. `TlsConfig` defines TLS settings (versions, peer verification, CA file, SNI)
//! 2. `TlsSessionOps` implements the `SessionOps` trait for encrypted I/O
//! 3. The line transport swaps its plain stream for a `TlsSessionOps` and
//!    keeps framing lines exactly as before
//!
//! # Examples
//!
//! ```no_run
//! use tic_client::tic::tls::{TlsConfig, TlsVersion};
//! use tic_client::tic::LoginOptions;
//!
//! let tls = TlsConfig::client()
//!     .version_range(TlsVersion::Tls12, TlsVersion::Tls13)
//!     .ca_file("/etc/ssl/certs/tic-ca.pem")
//!     .build()
//!     .unwrap();
//!
//! let options = LoginOptions::builder().require_tls(true).tls(tls).build();
//! ```

pub mod config;
pub mod info;
pub mod session;

pub use config::{ClientConfigBuilder, TlsConfig, TlsError, TlsVersion};
pub use info::TlsInfo;
pub use session::TlsSessionOps;
