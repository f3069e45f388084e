//! TIC client session
//!
//! `TicClient` owns one transport and a two-state session. `login` is the
//! only operation that reports errors; every query after it is gated on the
//! session being connected and degrades to an empty result on any failure.

use super::handshake::{self, DEFAULT_QUIT_MESSAGE};
use super::record::{DetailRecord, Route, Tunnel};
use super::resource::{self, Listing, ResourceKind};
use super::tls::TlsInfo;
use super::transport::LineTransport;
use super::{LoginOptions, Result};
use std::fmt;
use tracing::{dispatcher, Dispatch};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Disconnected,
    Connected,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Disconnected => "disconnected",
            State::Connected => "connected",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// TIC client
///
/// Diagnostics go to the `tracing` dispatcher given at construction, not
/// to whatever global subscriber happens to be installed later.
pub struct TicClient {
    state: State,
    transport: Option<LineTransport>,
    dispatch: Dispatch,
}

impl TicClient {
    /// Create a disconnected client logging to the current default dispatcher
    pub fn new() -> Self {
        Self::with_dispatch(dispatcher::get_default(|d| d.clone()))
    }

    /// Create a disconnected client logging to `dispatch`
    pub fn with_dispatch(dispatch: Dispatch) -> Self {
        TicClient {
            state: State::Disconnected,
            transport: None,
            dispatch,
        }
    }

    /// Current session state
    pub fn state(&self) -> State {
        self.state
    }

    /// TLS details when the session was upgraded
    pub fn tls_info(&self) -> Option<&TlsInfo> {
        self.transport.as_ref().and_then(|t| t.tls_info())
    }

    /// Connect to `server` and authenticate
    ///
    /// Any failure leaves the client disconnected with the transport
    /// discarded. A client that is already connected drops its old session
    /// first.
    pub fn login(
        &mut self,
        username: &str,
        password: &str,
        server: &str,
        options: &LoginOptions,
    ) -> Result<()> {
        self.in_scope(|client| -> Result<()> {
            if client.state == State::Connected {
                tracing::warn!("already connected, dropping previous session");
            }
            client.reset();
            handshake::check_login_arguments(username, options.identity())?;

            tracing::debug!("Trying to connect to TIC server {}", server);
            let mut transport =
                LineTransport::connect(server, options.port(), options.connect_options())?;

            match handshake::login(&mut transport, server, username, password, options) {
                Ok(()) => {
                    client.transport = Some(transport);
                    client.state = State::Connected;
                    tracing::info!("session {}", client.state);
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!("login to {} failed: {}", server, e);
                    if let Err(close_err) = transport.close() {
                        tracing::debug!("close after failed login: {}", close_err);
                    }
                    Err(e)
                }
            }
        })
    }

    /// Say goodbye and drop the connection
    ///
    /// Sends `QUIT <message>` (default "bye"). A no-op with a warning when
    /// not connected.
    pub fn logout(&mut self, message: Option<&str>) {
        let message = message.unwrap_or(DEFAULT_QUIT_MESSAGE);
        let sent = self.gated("logout", |transport| {
            handshake::quit(transport, message).map(|_| true)
        });

        if sent {
            self.in_scope(|client| {
                client.reset();
                tracing::info!("session {}", client.state);
            });
        }
    }

    /// `tunnel list`
    pub fn list_tunnels(&mut self) -> Vec<Tunnel> {
        self.listing(&ResourceKind::TUNNEL)
            .map(|l| l.into_records().into_iter().map(Tunnel::from).collect())
            .unwrap_or_default()
    }

    /// `tunnel show <id>`
    pub fn get_tunnel(&mut self, id: &str) -> DetailRecord {
        self.show(&ResourceKind::TUNNEL, id)
    }

    /// `route list`
    pub fn list_routes(&mut self) -> Vec<Route> {
        self.listing(&ResourceKind::ROUTE)
            .map(|l| l.into_records().into_iter().map(Route::from).collect())
            .unwrap_or_default()
    }

    /// `route show <id>`
    pub fn get_route(&mut self, id: &str) -> DetailRecord {
        self.show(&ResourceKind::ROUTE, id)
    }

    /// `pop list`
    pub fn list_pops(&mut self) -> Vec<String> {
        self.listing(&ResourceKind::POP)
            .map(Listing::into_identifiers)
            .unwrap_or_default()
    }

    /// `pop show <id>`
    pub fn get_pop(&mut self, id: &str) -> DetailRecord {
        self.show(&ResourceKind::POP, id)
    }

    /// `<verb> show <id>` for any resource kind
    pub fn show(&mut self, kind: &ResourceKind, id: &str) -> DetailRecord {
        self.gated(&kind.show_command(id), |transport| {
            resource::show(transport, kind, id)
        })
    }

    fn listing(&mut self, kind: &ResourceKind) -> Option<Listing> {
        self.gated(&kind.list_command(), |transport| {
            resource::list(transport, kind).map(Some)
        })
    }

    /// Run `op` only when connected, turning every failure into `T::default()`
    ///
    /// Connection-level failures also tear the session down, since the
    /// transport can no longer be trusted to be at a reply boundary.
    fn gated<T, F>(&mut self, operation: &str, op: F) -> T
    where
        T: Default,
        F: FnOnce(&mut LineTransport) -> Result<T>,
    {
        self.in_scope(|client| {
            let transport = match (client.state, client.transport.as_mut()) {
                (State::Connected, Some(transport)) => transport,
                _ => {
                    tracing::warn!("{}: not connected", operation);
                    return T::default();
                }
            };

            let err = match op(&mut *transport) {
                Ok(value) => return value,
                Err(e) => e,
            };

            if err.is_connection() || !transport.is_open() {
                tracing::error!("{} failed, dropping session: {}", operation, err);
                client.reset();
            } else {
                tracing::warn!("{} failed: {}", operation, err);
            }
            T::default()
        })
    }

    fn in_scope<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let dispatch = self.dispatch.clone();
        dispatcher::with_default(&dispatch, || f(self))
    }

    fn reset(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.close() {
                tracing::debug!("close failed: {}", e);
            }
        }
        self.state = State::Disconnected;
    }
}

impl Default for TicClient {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TicClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TicClient")
            .field("state", &self.state)
            .field("tls", &self.transport.as_ref().map(|t| t.is_tls()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_client_is_disconnected() {
        let client = TicClient::new();
        assert_eq!(client.state(), State::Disconnected);
        assert!(client.tls_info().is_none());
    }

    #[test]
    fn test_disconnected_queries_are_empty() {
        let mut client = TicClient::with_dispatch(Dispatch::none());

        assert!(client.list_tunnels().is_empty());
        assert!(client.list_routes().is_empty());
        assert!(client.list_pops().is_empty());
        assert!(client.get_tunnel("T1").is_empty());
        assert!(client.get_route("R1").is_empty());
        assert!(client.get_pop("nlams01").is_empty());
        assert_eq!(client.state(), State::Disconnected);
    }

    #[test]
    fn test_logout_when_disconnected_is_noop() {
        let mut client = TicClient::with_dispatch(Dispatch::none());
        client.logout(None);
        client.logout(Some("again"));
        assert_eq!(client.state(), State::Disconnected);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(State::Connected.to_string(), "connected");
        assert_eq!(State::Disconnected.to_string(), "disconnected");
    }
}
