//! In-process fake TIC server for integration tests
//!
//! Each server accepts exactly one connection on `127.0.0.1:0` and runs a
//! scripted handler on it in a spawned thread.

#![allow(dead_code)]

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::ssl::{SslAcceptor, SslMethod, SslStream};
use openssl::x509::extension::SubjectAlternativeName;
use openssl::x509::{X509Builder, X509NameBuilder, X509};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tic_client::tic::{LoginOptions, LoginOptionsBuilder, TlsMode};

pub const USERNAME: &str = "demo";
pub const PASSWORD: &str = "pw";
pub const CHALLENGE: &str = "abc123";
/// md5("abc123" + md5("pw"))
pub const SIGNATURE: &str = "9e6d86ec56f5668d5deb0aa3de617c6e";

/// Server side of the connection, plain or TLS
pub enum Stream {
    Plain(TcpStream),
    Tls(SslStream<TcpStream>),
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Plain(s) => s.read(buf),
            Stream::Tls(s) => s.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Plain(s) => s.write(buf),
            Stream::Tls(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Plain(s) => s.flush(),
            Stream::Tls(s) => s.flush(),
        }
    }
}

/// The fake server's view of one client connection
pub struct Peer {
    reader: Option<BufReader<Stream>>,
    received: Vec<String>,
}

impl Peer {
    fn new(stream: TcpStream) -> Self {
        Peer {
            reader: Some(BufReader::new(Stream::Plain(stream))),
            received: Vec::new(),
        }
    }

    fn reader(&mut self) -> &mut BufReader<Stream> {
        self.reader.as_mut().expect("peer stream taken")
    }

    /// Read one line from the client; None on EOF
    pub fn recv(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.reader().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let line = line.trim_end_matches(['\r', '\n']).to_string();
                self.received.push(line.clone());
                Some(line)
            }
        }
    }

    /// Read one line and assert it equals `expected`
    pub fn expect(&mut self, expected: &str) {
        assert_eq!(self.recv().as_deref(), Some(expected));
    }

    /// Read one line and assert it starts with `prefix`
    pub fn expect_prefix(&mut self, prefix: &str) -> String {
        let line = self.recv().expect("client closed early");
        assert!(line.starts_with(prefix), "{:?} does not start with {:?}", line, prefix);
        line
    }

    /// Send one line to the client
    pub fn send(&mut self, line: &str) {
        let stream = self.reader().get_mut();
        stream.write_all(line.as_bytes()).unwrap();
        stream.write_all(b"\n").unwrap();
        stream.flush().unwrap();
    }

    /// Send one line, reporting rather than panicking if the client is gone
    pub fn try_send(&mut self, line: &str) -> io::Result<()> {
        let stream = self.reader().get_mut();
        stream.write_all(line.as_bytes())?;
        stream.write_all(b"\n")?;
        stream.flush()
    }

    /// Send several lines
    pub fn send_all(&mut self, lines: &[&str]) {
        for line in lines {
            self.send(line);
        }
    }

    /// Run the server side of a TLS handshake on the current socket
    pub fn starttls(&mut self, acceptor: &SslAcceptor) -> Result<(), String> {
        let reader = self.reader.take().expect("peer stream taken");
        assert!(reader.buffer().is_empty(), "client sent data before handshake");

        let tcp = match reader.into_inner() {
            Stream::Plain(tcp) => tcp,
            Stream::Tls(_) => panic!("already TLS"),
        };

        let tls = acceptor.accept(tcp).map_err(|e| e.to_string())?;
        self.reader = Some(BufReader::new(Stream::Tls(tls)));
        Ok(())
    }

    /// Drop the connection
    pub fn hang_up(&mut self) {
        self.reader.take();
    }
}

/// Spawn a one-shot server; the join handle yields every line received
pub fn spawn_server<F>(handler: F) -> (u16, JoinHandle<Vec<String>>)
where
    F: FnOnce(&mut Peer) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(10)))
            .unwrap();
        let mut peer = Peer::new(stream);
        handler(&mut peer);
        peer.received
    });

    (port, handle)
}

pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// How the fake server answers `starttls`
pub enum StartTls<'a> {
    /// Client is not expected to ask
    NotAsked,
    /// Answer with a 4xx refusal
    Refuse,
    /// Accept and handshake with this acceptor
    Accept(&'a SslAcceptor),
}

/// Play the server side of a successful login
pub fn serve_login(peer: &mut Peer, starttls: StartTls<'_>) {
    serve_until_clock(peer, now());

    match starttls {
        StartTls::NotAsked => {}
        StartTls::Refuse => {
            peer.expect("starttls");
            peer.send("400 This service is not SSL enabled (yet)");
        }
        StartTls::Accept(acceptor) => {
            peer.expect("starttls");
            peer.send("200 Starting TLS");
            peer.starttls(acceptor).unwrap();
        }
    }

    serve_authentication(peer, SIGNATURE);
}

/// Welcome, identification and the clock exchange
pub fn serve_until_clock(peer: &mut Peer, server_time: i64) {
    peer.send("200 TIC test service ready");
    peer.expect_prefix("client TIC/draft-00 ");
    peer.send("200 Client Identity accepted");
    peer.expect("get unixtime");
    peer.send(&format!("200 {}", server_time));
}

/// Username, challenge and authenticate; `expected` is the signature to accept
pub fn serve_authentication(peer: &mut Peer, expected: &str) {
    peer.expect(&format!("username {}", USERNAME));
    peer.send("200 Choose your authentication challenge please");
    peer.expect("challenge md5");
    peer.send(&format!("200 {}", CHALLENGE));
    peer.expect(&format!("authenticate md5 {}", expected));
    peer.send(&format!("200 Successfully logged in using md5 as {}", USERNAME));
}

/// Options pointing at a fake server
pub fn options(port: u16, mode: TlsMode) -> LoginOptionsBuilder {
    LoginOptions::builder()
        .port(port)
        .tls_mode(mode)
        .connect_timeout(Some(Duration::from_secs(5)))
        .io_timeout(Some(Duration::from_secs(5)))
}

/// Throwaway self-signed certificate for 127.0.0.1 / localhost
pub fn self_signed() -> (X509, PKey<Private>) {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "localhost").unwrap();
    let name = name.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(1).unwrap())
        .unwrap();

    let san = SubjectAlternativeName::new()
        .dns("localhost")
        .ip("127.0.0.1")
        .build(&builder.x509v3_context(None, None))
        .unwrap();
    builder.append_extension(san).unwrap();

    builder.sign(&key, MessageDigest::sha256()).unwrap();
    (builder.build(), key)
}

/// Server-side TLS acceptor using `cert`/`key`
pub fn acceptor(cert: &X509, key: &PKey<Private>) -> SslAcceptor {
    let mut builder = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
    builder.set_private_key(key).unwrap();
    builder.set_certificate(cert).unwrap();
    builder.build()
}
