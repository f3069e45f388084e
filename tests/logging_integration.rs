//! Diagnostics go to the dispatcher handed to the client

mod common;

use common::{options, serve_login, spawn_server, StartTls};
use std::io;
use std::sync::{Arc, Mutex};
use tic_client::tic::{TicClient, TlsMode};
use tracing::{Dispatch, Level};

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capturing_dispatch(level: Level) -> (Dispatch, Capture) {
    let capture = Capture::default();
    let writer = capture.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(level)
        .finish();

    (Dispatch::new(subscriber), capture)
}

#[test]
fn test_not_connected_warning() {
    let (dispatch, capture) = capturing_dispatch(Level::DEBUG);
    let mut client = TicClient::with_dispatch(dispatch);

    assert!(client.list_tunnels().is_empty());
    client.logout(None);

    let logs = capture.contents();
    assert!(logs.contains("WARN"), "{}", logs);
    assert!(logs.contains("tunnel list: not connected"), "{}", logs);
    assert!(logs.contains("logout: not connected"), "{}", logs);
}

#[test]
fn test_login_traffic_is_logged_without_signature() {
    let (port, server) = spawn_server(|peer| {
        serve_login(peer, StartTls::NotAsked);
        peer.expect("QUIT bye");
    });

    let (dispatch, capture) = capturing_dispatch(Level::DEBUG);
    let mut client = TicClient::with_dispatch(dispatch);
    client
        .login(common::USERNAME, common::PASSWORD, "127.0.0.1", &options(port, TlsMode::Disabled).build())
        .unwrap();
    client.logout(None);
    server.join().unwrap();

    let logs = capture.contents();
    assert!(logs.contains("--> get unixtime"), "{}", logs);
    assert!(logs.contains("--> username demo"), "{}", logs);
    assert!(logs.contains("authenticate md5 <redacted>"), "{}", logs);
    assert!(logs.contains("--> QUIT bye"), "{}", logs);
    assert!(!logs.contains(common::SIGNATURE), "signature leaked: {}", logs);
}

#[test]
fn test_level_filtering() {
    let (dispatch, capture) = capturing_dispatch(Level::ERROR);
    let mut client = TicClient::with_dispatch(dispatch);

    assert!(client.list_pops().is_empty());
    assert!(capture.contents().is_empty());
}
