//! Login handshake
//!
//! Drives the fixed login sequence over a freshly connected transport:
//!
//! 1. read the unsolicited welcome
//! 2. `client` identification
//! 3. `get unixtime` and the clock check
//! 4. `starttls` (depending on `TlsMode`)
//! 5. `username`
//! 6. `challenge md5` / `authenticate md5`
//!
//! Nothing is retried. The first failure ends the login.

use super::clock;
use super::codec::{check_argument, read_single_reply, send_command};
use super::config::{ClientIdentity, LoginOptions, TlsMode};
use super::tls::TlsConfig;
use super::transport::{LineIo, LineTransport};
use super::{Error, Result, PROTOCOL_VERSION};
use openssl::hash::{hash, MessageDigest};

/// Farewell sent when the caller gives none
pub const DEFAULT_QUIT_MESSAGE: &str = "bye";

/// Runtime half of the platform descriptor in the `client` line
pub const RUNTIME_TAG: &str = concat!("Rust-", env!("CARGO_PKG_RUST_VERSION"));

/// Lowercase hex MD5 of `data`
fn md5_hex(data: &[u8]) -> Result<String> {
    let digest = hash(MessageDigest::md5(), data)?;
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}

/// Response to an MD5 challenge: `md5_hex(challenge + md5_hex(password))`
pub fn signature(challenge: &str, password: &str) -> Result<String> {
    let mut input = challenge.to_string();
    input.push_str(&md5_hex(password.as_bytes())?);
    md5_hex(input.as_bytes())
}

/// The `client` identification line
pub fn client_identification(identity: &ClientIdentity) -> String {
    format!(
        "client TIC/{} {}/{} {}/{}",
        PROTOCOL_VERSION,
        identity.name,
        identity.version,
        std::env::consts::OS,
        RUNTIME_TAG
    )
}

/// Send `QUIT <message>`
///
/// The server hangs up right after, so no reply is read.
pub fn quit<T: LineIo + ?Sized>(io: &mut T, message: &str) -> Result<()> {
    check_argument("QUIT message", message)?;
    send_command(io, &format!("QUIT {}", message))
}

/// Check everything the caller puts on the wire during login
///
/// Runs before connecting, so a bad value never costs a round trip.
pub fn check_login_arguments(username: &str, identity: &ClientIdentity) -> Result<()> {
    check_argument("username", username)?;
    check_argument("client name", &identity.name)?;
    check_argument("client version", &identity.version)
}

/// Run the full login sequence
///
/// `host` is the name the transport was dialed with; it is used to verify
/// the server certificate when TLS is negotiated.
pub fn login(
    transport: &mut LineTransport,
    host: &str,
    username: &str,
    password: &str,
    options: &LoginOptions,
) -> Result<()> {
    let welcome = read_single_reply(transport)?;
    tracing::info!("connected to {}: {}", host, welcome.message());

    send_command(transport, &client_identification(options.identity()))?;
    read_single_reply(transport)?;

    check_clock(transport, options.clock_tolerance())?;

    negotiate_tls(transport, host, options)?;

    send_command(transport, &format!("username {}", username))?;
    read_single_reply(transport)?;

    send_command(transport, "challenge md5")?;
    let challenge = read_single_reply(transport)?;
    let signature = signature(challenge.message().trim_end(), password)?;

    // Keep the one-time signature out of the logs
    tracing::debug!("--> authenticate md5 <redacted>");
    transport.send_line(&format!("authenticate md5 {}", signature))?;
    read_single_reply(transport)?;

    tracing::info!("authenticated as {}", username);
    Ok(())
}

fn check_clock<T: LineIo + ?Sized>(io: &mut T, tolerance: u64) -> Result<()> {
    send_command(io, "get unixtime")?;
    let reply = read_single_reply(io)?;

    let server_time = reply.message().trim().parse::<i64>().map_err(|_| {
        Error::Malformed(format!("unixtime reply is not an integer: {:?}", reply.message()))
    })?;

    match clock::check(server_time, clock::local_epoch_seconds(), tolerance) {
        Ok(_) => Ok(()),
        Err(Error::ClockSkew { skew, tolerance }) => {
            let message = format!(
                "The clock is off by {} seconds, use NTP to sync it!",
                skew
            );
            tracing::error!("{}", message);
            if let Err(e) = quit(io, &message) {
                tracing::debug!("QUIT after clock check failed: {}", e);
            }
            Err(Error::ClockSkew { skew, tolerance })
        }
        Err(e) => Err(e),
    }
}

fn negotiate_tls(transport: &mut LineTransport, host: &str, options: &LoginOptions) -> Result<()> {
    if options.tls_mode() == TlsMode::Disabled {
        tracing::debug!("TLS disabled, staying in plaintext");
        return Ok(());
    }

    // Build before asking, so a bad config never leaves the server mid-handshake
    let config = match options.tls_config() {
        Some(config) => config.clone(),
        None => TlsConfig::client().build()?,
    };

    send_command(transport, "starttls")?;
    match read_single_reply(transport) {
        Ok(_) => {}
        Err(Error::Protocol { code, message }) => {
            if options.tls_mode() == TlsMode::Required {
                tracing::error!("TLS required but server refused: {} {}", code, message);
                if let Err(e) = quit(transport, "TLS is required") {
                    tracing::debug!("QUIT after starttls refusal failed: {}", e);
                }
                return Err(Error::TlsUnavailable(format!("{} {}", code, message)));
            }
            tracing::warn!("TLS unsupported ({} {}), continuing unencrypted", code, message);
            return Ok(());
        }
        Err(e) => return Err(e),
    }

    if let Err(e) = transport.upgrade_to_tls(&config, host) {
        tracing::error!("TLS upgrade failed: {}", e);
        // The handshake consumed the socket; this QUIT only goes out if a
        // stream is somehow still there
        if transport.is_open() {
            quit(transport, "TLS negotiation failed").ok();
        }
        return Err(e);
    }

    if let Some(info) = transport.tls_info() {
        tracing::info!("TLS negotiated: {} {}", info.version, info.cipher);
    }
    Ok(())
}
