//! Login configuration
//!
//! Options recognized by `TicClient::login`, built with a consuming builder.

use super::clock::DEFAULT_TOLERANCE_SECS;
use super::tls::TlsConfig;
use super::DEFAULT_TIC_PORT;
use crate::net::ConnectOptions;
use std::time::Duration;

/// How the handshake treats `starttls`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsMode {
    /// Never send `starttls`
    Disabled,
    /// Upgrade when the server offers it, continue in plaintext otherwise
    #[default]
    Opportunistic,
    /// Abort the login if the server cannot upgrade
    Required,
}

/// Client name and version advertised in the `client` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub name: String,
    pub version: String,
}

impl ClientIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        ClientIdentity {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl Default for ClientIdentity {
    fn default() -> Self {
        ClientIdentity::new("TIC-RS", env!("CARGO_PKG_VERSION"))
    }
}

/// Options for `TicClient::login` (immutable after building)
///
/// # Examples
///
/// ```
/// use tic_client::tic::{LoginOptions, TlsMode};
/// use std::time::Duration;
///
/// let options = LoginOptions::builder()
///     .require_tls(true)
///     .connect_timeout(Some(Duration::from_secs(5)))
///     .build();
///
/// assert_eq!(options.tls_mode(), TlsMode::Required);
/// assert_eq!(options.port(), 3874);
/// ```
#[derive(Debug, Clone)]
pub struct LoginOptions {
    port: u16,
    tls_mode: TlsMode,
    tls: Option<TlsConfig>,
    connect_timeout: Option<Duration>,
    io_timeout: Option<Duration>,
    clock_tolerance: u64,
    identity: ClientIdentity,
}

impl Default for LoginOptions {
    fn default() -> Self {
        LoginOptions::builder().build()
    }
}

impl LoginOptions {
    /// Create a new options builder
    pub fn builder() -> LoginOptionsBuilder {
        LoginOptionsBuilder::new()
    }

    /// Server port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// How `starttls` is handled
    pub fn tls_mode(&self) -> TlsMode {
        self.tls_mode
    }

    /// Explicit TLS configuration, if one was given
    pub fn tls_config(&self) -> Option<&TlsConfig> {
        self.tls.as_ref()
    }

    /// Allowed clock difference in seconds
    pub fn clock_tolerance(&self) -> u64 {
        self.clock_tolerance
    }

    /// Client name/version sent during identification
    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub(crate) fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            connect_timeout: self.connect_timeout,
            io_timeout: self.io_timeout,
        }
    }
}

/// Login options builder
#[derive(Debug, Clone)]
pub struct LoginOptionsBuilder {
    options: LoginOptions,
}

impl LoginOptionsBuilder {
    fn new() -> Self {
        LoginOptionsBuilder {
            options: LoginOptions {
                port: DEFAULT_TIC_PORT,
                tls_mode: TlsMode::default(),
                tls: None,
                connect_timeout: None,
                io_timeout: None,
                clock_tolerance: DEFAULT_TOLERANCE_SECS,
                identity: ClientIdentity::default(),
            },
        }
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.options.port = port;
        self
    }

    /// Set how `starttls` is handled
    pub fn tls_mode(mut self, mode: TlsMode) -> Self {
        self.options.tls_mode = mode;
        self
    }

    /// Abort the login if the server cannot upgrade to TLS
    pub fn require_tls(self, required: bool) -> Self {
        self.tls_mode(if required {
            TlsMode::Required
        } else {
            TlsMode::Opportunistic
        })
    }

    /// Use this TLS configuration for the upgrade
    ///
    /// Without one, a default configuration that verifies the server
    /// against the system trust store is built at upgrade time.
    pub fn tls(mut self, config: TlsConfig) -> Self {
        self.options.tls = Some(config);
        self
    }

    /// Bound the TCP connect
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    /// Install a read/write deadline on the socket
    pub fn io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.options.io_timeout = timeout;
        self
    }

    /// Allowed clock difference in seconds
    pub fn clock_tolerance(mut self, seconds: u64) -> Self {
        self.options.clock_tolerance = seconds;
        self
    }

    /// Client name/version sent during identification
    pub fn identity(mut self, identity: ClientIdentity) -> Self {
        self.options.identity = identity;
        self
    }

    /// Build the options
    pub fn build(self) -> LoginOptions {
        self.options
    }
}
